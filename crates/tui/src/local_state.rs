use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Small per-user memory kept between runs. Never holds credentials or
/// tokens.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocalState {
    pub last_email: Option<String>,
    #[serde(default)]
    pub last_trips: Vec<LastTrip>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastTrip {
    pub email: String,
    pub trip_id: String,
}

impl LocalState {
    pub fn load(path: &str) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let parent = Path::new(path).parent();
        if let Some(parent) = parent {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(self)?;
        fs::write(path, payload)?;
        Ok(())
    }

    pub fn last_trip_for(&self, email: &str) -> Option<&str> {
        self.last_trips
            .iter()
            .find(|entry| entry.email == email)
            .map(|entry| entry.trip_id.as_str())
    }

    pub fn set_last_trip(&mut self, email: &str, trip_id: &str) {
        if let Some(entry) = self.last_trips.iter_mut().find(|entry| entry.email == email) {
            entry.trip_id = trip_id.to_string();
            return;
        }
        self.last_trips.push(LastTrip {
            email: email.to_string(),
            trip_id: trip_id.to_string(),
        });
    }
}
