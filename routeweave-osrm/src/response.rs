//! OSRM API response types for the Table and Route services.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#table-service> and
//! <http://project-osrm.org/docs/v5.24.0/api/#route-service>

use serde::{Deserialize, Serialize};

/// Response code reported by OSRM on success.
pub const OK_CODE: &str = "Ok";

/// OSRM Table API response.
///
/// The response contains the requested matrices on success or an error
/// message on failure. The `code` field indicates the response status.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableResponse {
    /// Status code from OSRM.
    ///
    /// Common values:
    /// - `"Ok"` - Request was successful
    /// - `"InvalidQuery"` - Invalid query parameters
    /// - `"InvalidOptions"` - Invalid option combination
    /// - `"NoTable"` - Table computation failed
    pub code: String,

    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,

    /// Matrix of distances in metres, `None` cells being unreachable.
    pub distances: Option<Vec<Vec<Option<f64>>>>,

    /// Matrix of durations in seconds, `None` cells being unreachable.
    pub durations: Option<Vec<Vec<Option<f64>>>>,
}

impl TableResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == OK_CODE
    }
}

/// OSRM Route API response, restricted to the fields the client reads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct RouteResponse {
    /// Status code from OSRM.
    pub code: String,
    /// Optional error message when `code` is not `"Ok"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Calculated route first, alternatives after it.
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl RouteResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == OK_CODE
    }
}

/// Partial OSRM route object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Route {
    /// Encoded overview geometry of the whole route.
    pub geometry: String,
    /// Legs between consecutive waypoints.
    #[serde(default)]
    pub legs: Vec<Leg>,
}

/// Partial OSRM route leg object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Leg {
    /// Manoeuvres along the leg, in travel order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Partial OSRM route step object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Step {
    /// Encoded geometry of the step.
    pub geometry: String,
}
