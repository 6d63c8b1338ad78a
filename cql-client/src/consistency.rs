#![warn(missing_docs)]
//! The module contains Rust representation of Cassandra consistency levels.
use derive_more::Display;
use std::str::FromStr;

use crate::error;

/// `Consistency` is an enum which represents Cassandra's consistency levels.
/// To find more details about each consistency level please refer to the following documentation:
/// <https://docs.datastax.com/en/cql-oss/3.x/cql/cql_reference/cqlshConsistency.html>
#[derive(Debug, PartialEq, Clone, Copy, Display, Ord, PartialOrd, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Consistency {
    /// Closest replica, as determined by the snitch. Can only be used for writes.
    Any,
    /// At least one replica node.
    One,
    /// At least two replica nodes.
    Two,
    /// At least three replica nodes.
    Three,
    /// A quorum of replica nodes. Used by the client when no consistency is given.
    #[default]
    Quorum,
    /// All replica nodes in the cluster for that partition key.
    All,
    /// A quorum of replica nodes in the same data center as the coordinator node.
    LocalQuorum,
    /// A quorum of replica nodes in all data centers.
    EachQuorum,
    /// Linearizable consistency for lightweight transactions.
    Serial,
    /// Same as SERIAL but confined to the data center.
    LocalSerial,
    /// At least one replica node in the local data center.
    LocalOne,
}

impl FromStr for Consistency {
    type Err = error::Error;

    /// Accepts both `LocalQuorum` and `local_quorum` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let consistency = match s {
            "Any" | "any" => Consistency::Any,
            "One" | "one" => Consistency::One,
            "Two" | "two" => Consistency::Two,
            "Three" | "three" => Consistency::Three,
            "Quorum" | "quorum" => Consistency::Quorum,
            "All" | "all" => Consistency::All,
            "LocalQuorum" | "local_quorum" => Consistency::LocalQuorum,
            "EachQuorum" | "each_quorum" => Consistency::EachQuorum,
            "Serial" | "serial" => Consistency::Serial,
            "LocalSerial" | "local_serial" => Consistency::LocalSerial,
            "LocalOne" | "local_one" => Consistency::LocalOne,
            _ => {
                return Err(error::Error::General(format!(
                    "Invalid consistency provided: {s}"
                )))
            }
        };

        Ok(consistency)
    }
}
