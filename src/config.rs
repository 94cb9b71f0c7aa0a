use std::collections::BTreeMap;

use chrono::TimeDelta;

/// Tabella di routing: selettore workflow -> endpoint del processore
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowRoutes {
    routes: BTreeMap<String, String>,
}

impl WorkflowRoutes {
    /// Interpreta coppie `NOME=url` separate da virgola.
    ///
    /// Le coppie malformate vengono scartate con un warning.
    pub fn parse(raw: &str) -> Self {
        let mut routes = Self::default();

        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((name, url)) if !name.trim().is_empty() && !url.trim().is_empty() => {
                    routes.insert(name.trim(), url.trim());
                }
                _ => {
                    tracing::warn!("Route workflow ignorata (formato atteso NOME=url): {}", pair);
                }
            }
        }

        routes
    }

    pub fn insert(&mut self, selector: &str, endpoint: &str) {
        self.routes
            .insert(selector.to_uppercase(), endpoint.to_string());
    }

    /// Risolve l'endpoint per un selettore (case-insensitive)
    pub fn resolve(&self, selector: &str) -> Option<&str> {
        self.routes
            .get(&selector.trim().to_uppercase())
            .map(String::as_str)
    }

    pub fn names(&self) -> Vec<String> {
        self.routes.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for WorkflowRoutes {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut routes = Self::default();
        for (selector, endpoint) in iter {
            routes.insert(selector, endpoint);
        }
        routes
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// URL pubblico con cui i processori raggiungono le callback
    pub public_url: String,
    pub workflows: WorkflowRoutes,
    pub dispatch_timeout_secs: u64,
    /// None = i job non vengono mai rimossi
    pub job_retention_hours: Option<u64>,
    pub cleanup_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            public_url: "http://localhost:4000".to_string(),
            workflows: WorkflowRoutes::default(),
            dispatch_timeout_secs: 10,
            job_retention_hours: None,
            cleanup_interval_secs: 3600,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("GENRELAY_HOST") {
            config.host = host;
        }

        if let Ok(port) = std::env::var("GENRELAY_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }

        if let Ok(url) = std::env::var("GENRELAY_PUBLIC_URL") {
            config.public_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(workflows) = std::env::var("GENRELAY_WORKFLOWS") {
            config.workflows = WorkflowRoutes::parse(&workflows);
        }

        if let Ok(timeout) = std::env::var("GENRELAY_DISPATCH_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                config.dispatch_timeout_secs = t;
            }
        }

        if let Ok(hours) = std::env::var("GENRELAY_JOB_RETENTION_HOURS") {
            match hours.trim().parse::<u64>() {
                Ok(h) if retention_delta(h).is_some() => config.job_retention_hours = Some(h),
                _ => tracing::warn!(
                    "GENRELAY_JOB_RETENTION_HOURS non valido ({}), pulizia job disabilitata",
                    hours
                ),
            }
        }

        if let Ok(interval) = std::env::var("GENRELAY_CLEANUP_INTERVAL_SECS") {
            if let Ok(i) = interval.parse() {
                config.cleanup_interval_secs = i;
            }
        }

        config
    }

    /// Finestra di conservazione dei job terminati, se configurata
    pub fn retention(&self) -> Option<TimeDelta> {
        self.job_retention_hours.and_then(retention_delta)
    }
}

/// Converte ore in `TimeDelta`, `None` se il valore non è rappresentabile
pub fn retention_delta(hours: u64) -> Option<TimeDelta> {
    i64::try_from(hours).ok().and_then(TimeDelta::try_hours)
}

/// Indirizzo di callback per un job
pub fn callback_url(public_url: &str, job_id: &str) -> String {
    format!("{}/callback/{}", public_url.trim_end_matches('/'), job_id)
}
