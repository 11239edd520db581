//! Static support resources.

use axum::Json;

use calmly_core::crisis::{EMERGENCY_CONTACTS, EmergencyContact};

/// GET /api/resources/crisis
///
/// Public: someone in distress should not need an account to see these.
pub async fn crisis() -> Json<&'static [EmergencyContact]> {
    Json(&EMERGENCY_CONTACTS)
}
