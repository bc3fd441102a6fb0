use std::fmt::{Display, Formatter};
use crate::ip::IpFamily;

pub mod gandi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Aaaa,
}

impl RecordType {
    pub const ALL: [RecordType; 2] = [RecordType::A, RecordType::Aaaa];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// The address family a record of this type points at.
    pub fn family(&self) -> IpFamily {
        match self {
            RecordType::A => IpFamily::V4,
            RecordType::Aaaa => IpFamily::V6,
        }
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(test, mockall::automock(type Error = gandi::GandiError;))]
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the rrset values of `name` in `domain`, empty if the record
    /// does not exist.
    async fn get_record(&self, domain: &str, name: &str, rtype: RecordType) -> Result<Vec<String>, Self::Error>;

    /// Replaces the rrset of `name` in `domain` with the single `value`.
    async fn update_record(&self, domain: &str, name: &str, rtype: RecordType, value: &str) -> Result<(), Self::Error>;
}
