use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Mahasiswa,
    Admin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_known_roles() {
        assert_eq!(Role::from_str("mahasiswa").unwrap(), Role::Mahasiswa);
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(Role::from_str("dosen").is_err());
        assert!(Role::from_str("").is_err());
        assert!(Role::from_str("Admin ").is_err());
    }

    #[test]
    fn displays_lowercase() {
        assert_eq!(Role::Mahasiswa.to_string(), "mahasiswa");
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
