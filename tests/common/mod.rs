//! Shared fixture: a seeded in-memory world with two organizations, two
//! departments, two stores, and enough records to exercise scope, filter
//! and pagination behavior.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Map, Value};
use uuid::Uuid;

use atrium_api::query::{Principal, RawRequest};
use atrium_api::resources;
use atrium_api::services::{SearchService, WaitlistService};
use atrium_api::storage::MemoryGateway;

pub const ORG_A: Uuid = Uuid::from_u128(0xA1);
pub const ORG_B: Uuid = Uuid::from_u128(0xB1);
pub const DEPT_A1: Uuid = Uuid::from_u128(0xD1);
pub const DEPT_A2: Uuid = Uuid::from_u128(0xD2);
pub const PRACT_1: Uuid = Uuid::from_u128(0xE1); // org A, dept A1
pub const PRACT_2: Uuid = Uuid::from_u128(0xE2); // org A, dept A2
pub const PRACT_3: Uuid = Uuid::from_u128(0xE3); // org B
pub const PATIENT_1: Uuid = Uuid::from_u128(0xF1);
pub const PATIENT_2: Uuid = Uuid::from_u128(0xF2);
pub const STORE_S: Uuid = Uuid::from_u128(0x51);
pub const STORE_T: Uuid = Uuid::from_u128(0x52);
pub const INGREDIENT_I: Uuid = Uuid::from_u128(0x31);
pub const INGREDIENT_J: Uuid = Uuid::from_u128(0x32);

pub const APPT_A1: Uuid = Uuid::from_u128(0x1001); // org A, dept A1, pract 1
pub const APPT_A2: Uuid = Uuid::from_u128(0x1002); // org A, dept A1, pract 1
pub const APPT_A3: Uuid = Uuid::from_u128(0x1003); // org A, dept A2, pract 2
pub const APPT_B1: Uuid = Uuid::from_u128(0x1004); // org B, pract 3

pub struct World {
    pub gateway: Arc<MemoryGateway>,
    pub search: SearchService,
    pub waitlist: WaitlistService,
}

pub async fn seed_world() -> World {
    let gateway = Arc::new(MemoryGateway::new());

    seed_appointments(&gateway).await;
    seed_prices(&gateway).await;

    let search = SearchService::new(resources::registry(), gateway.clone());
    let waitlist = WaitlistService::new(search.clone());
    World { gateway, search, waitlist }
}

async fn seed_appointments(gateway: &MemoryGateway) {
    let rows = [
        appointment_row(APPT_A1, ORG_A, Some(DEPT_A1), PRACT_1, PATIENT_1, "booked", "2026-03-01T10:00:00+00:00", Some("Annual checkup")),
        appointment_row(APPT_A2, ORG_A, Some(DEPT_A1), PRACT_1, PATIENT_2, "requested", "2026-03-02T10:00:00+00:00", None),
        appointment_row(APPT_A3, ORG_A, Some(DEPT_A2), PRACT_2, PATIENT_1, "booked", "2026-03-03T10:00:00+00:00", Some("Follow-up")),
        appointment_row(APPT_B1, ORG_B, None, PRACT_3, PATIENT_2, "booked", "2026-03-04T10:00:00+00:00", None),
    ];
    for row in rows {
        gateway.seed("appointments", row).await;
    }
}

async fn seed_prices(gateway: &MemoryGateway) {
    // The 5-record (store S, ingredient I) grid: prices 100..140 with
    // availability alternating true/false/true/false/true.
    for (i, price) in [100, 110, 120, 130, 140].into_iter().enumerate() {
        let row = price_row(
            Uuid::from_u128(0x2001 + i as u128),
            STORE_S,
            INGREDIENT_I,
            price,
            i % 2 == 0,
            None,
        );
        gateway.seed("ingredient_prices", row).await;
    }
    // Noise in another store and another ingredient
    gateway
        .seed("ingredient_prices", price_row(Uuid::from_u128(0x2101), STORE_T, INGREDIENT_I, 105, true, None))
        .await;
    gateway
        .seed("ingredient_prices", price_row(Uuid::from_u128(0x2102), STORE_S, INGREDIENT_J, 115, true, None))
        .await;
}

pub fn appointment_row(
    id: Uuid,
    organization: Uuid,
    department: Option<Uuid>,
    practitioner: Uuid,
    patient: Uuid,
    status: &str,
    starts_at: &str,
    reason: Option<&str>,
) -> Map<String, Value> {
    json!({
        "id": id.to_string(),
        "status": status,
        "reason": reason,
        "starts_at": starts_at,
        "ends_at": null,
        "patient_id": patient.to_string(),
        "practitioner_id": practitioner.to_string(),
        "organization_id": organization.to_string(),
        "department_id": department.map(|d| d.to_string()),
        "deleted_at": null,
        "created_at": "2026-02-01T09:00:00+00:00",
        "updated_at": "2026-02-01T09:00:00+00:00",
    })
    .as_object()
    .cloned()
    .unwrap()
}

pub fn price_row(
    id: Uuid,
    store: Uuid,
    ingredient: Uuid,
    price: i64,
    available: bool,
    deleted_at: Option<&str>,
) -> Map<String, Value> {
    json!({
        "id": id.to_string(),
        "store_id": store.to_string(),
        "ingredient_id": ingredient.to_string(),
        "price": price,
        "available": available,
        "note": null,
        "created_by": PRACT_1.to_string(),
        "deleted_at": deleted_at,
        "created_at": "2026-01-15T08:00:00+00:00",
        "updated_at": "2026-01-20T08:00:00+00:00",
    })
    .as_object()
    .cloned()
    .unwrap()
}

pub fn platform_admin() -> Principal {
    Principal {
        id: Uuid::from_u128(0x9001),
        role: "platform_admin".to_string(),
        organization_ids: vec![],
        department_ids: vec![],
    }
}

pub fn org_admin(org: Uuid) -> Principal {
    Principal {
        id: Uuid::from_u128(0x9002),
        role: "org_admin".to_string(),
        organization_ids: vec![org],
        department_ids: vec![],
    }
}

pub fn dept_manager(org: Uuid, dept: Uuid) -> Principal {
    Principal {
        id: Uuid::from_u128(0x9003),
        role: "dept_manager".to_string(),
        organization_ids: vec![org],
        department_ids: vec![dept],
    }
}

pub fn staff(org: Uuid, id: Uuid) -> Principal {
    Principal {
        id,
        role: "staff".to_string(),
        organization_ids: vec![org],
        department_ids: vec![],
    }
}

pub fn raw(pairs: &[(&str, &str)]) -> RawRequest {
    RawRequest::from_pairs(pairs)
}
