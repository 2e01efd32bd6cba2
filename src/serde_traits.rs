//! JSON persistence for anything serde can carry: networks and run parameters.

use crate::error::WalkError;
use std::{fs, path::Path};

/// Types that can be written out as JSON.
pub trait ToFile {
    fn to_json(&self) -> Result<String, WalkError>;

    fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), WalkError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Types that can be read back from JSON.
pub trait FromFile: Sized {
    fn from_json(s: &str) -> Result<Self, WalkError>;

    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalkError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

impl<T: serde::Serialize> ToFile for T {
    fn to_json(&self) -> Result<String, WalkError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<T: for<'de> serde::Deserialize<'de>> FromFile for T {
    fn from_json(s: &str) -> Result<Self, WalkError> {
        serde_json::from_str(s).map_err(|op| op.into())
    }
}
