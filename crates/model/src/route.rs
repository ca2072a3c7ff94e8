use crate::normalize::{FieldReader, Normalize};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A delivery route listed on the routes page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord {
    pub id: String,
    pub location: String,
    pub state: String,
    /// Kept as text so leading zeros survive (`"00501"`).
    pub zip: String,
    #[serde(rename = "type")]
    pub route_type: String,
    /// Miles.
    pub length: f64,
    pub pay_rate: String,
}

impl Normalize for RouteRecord {
    const ID_PREFIX: &'static str = "route";

    fn read(reader: &mut FieldReader<'_>) -> Self {
        Self {
            id: reader.id(Self::ID_PREFIX),
            location: reader.text("location", &["location"]),
            state: reader.text("state", &["state"]),
            zip: reader.text("zip", &["zip", "zip_code", "zipcode"]),
            route_type: reader.text("type", &["type", "route_type"]),
            length: reader.non_negative_f64("length", &["length", "miles"]),
            pay_rate: reader.text("payRate", &["pay_rate", "payrate"]),
        }
    }
}
