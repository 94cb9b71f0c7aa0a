//! Generazione degli identificatori dei job

use uuid::Uuid;

/// Sorgente di ID job univoci e non indovinabili
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// UUID v4 (122 bit casuali) in formato esteso
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Ids;

impl IdGenerator for UuidV4Ids {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
