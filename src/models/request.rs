use serde::Deserialize;
use serde_json::{Map, Value};

/// Richiesta di generazione.
///
/// Solo `workflow` viene interpretato qui, tutti gli altri campi vengono
/// inoltrati al processore così come sono.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    /// Selettore del workflow (es. IMAGE, VIDEO)
    pub workflow: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// Corpo della callback inviata dal processore esterno
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    /// Lista di URL risultato, oppure la stessa lista codificata come stringa JSON
    #[serde(default, alias = "resultUrls", alias = "result")]
    pub image_urls: Option<Value>,
    #[serde(default)]
    pub final_prompt: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl CallbackPayload {
    /// Interpreta il corpo grezzo. Un corpo non JSON vale come payload vuoto.
    pub fn from_body(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }

        match serde_json::from_slice(body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Corpo callback non interpretabile, trattato come vuoto: {}", e);
                Self::default()
            }
        }
    }

    /// Messaggio di errore, se il processore ne ha riportato uno
    pub fn error_message(&self) -> Option<String> {
        match &self.error {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}
