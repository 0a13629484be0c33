//! Row shapes matching the SQL column types one-for-one (`TEXT` for closed
//! enums, plain scalars otherwise), with manual conversions to and from the
//! domain entities in `model`. Mirrors the donor's `*Row` + `with_origin`
//! conversion pattern, adapted to manual enum round-tripping since this
//! schema has no GTFS-style `sqlx::Type` derives to lean on.

use chrono::{DateTime, Utc};
use model::{
    dispatch_post::DispatchPostEntity,
    ids::{Point, Railcar},
    journey::JourneyEntity,
    journey_event::{EventType, JourneyEventEntity, PrecisionType, StopType, TransportDescriptor},
    server::ServerEntity,
    vehicle_sequence::{RailcarRef, SequenceResolveKey, VehicleSequenceEntity, VehicleSequenceStatus},
    Region, TransportCategory,
};
use utility::id::Id;
use uuid::Uuid;

use crate::DatabaseError;

#[derive(sqlx::FromRow)]
pub struct ServerRow {
    pub id: Uuid,
    pub code: String,
    pub region: String,
    pub scenery: String,
    pub utc_offset_hours: i16,
    pub spoken_language: String,
    pub tags: serde_json::Value,
    pub deleted: bool,
    pub registered_since: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl TryFrom<ServerRow> for ServerEntity {
    type Error = DatabaseError;

    fn try_from(row: ServerRow) -> Result<Self, Self::Error> {
        Ok(ServerEntity {
            id: Id::new(row.id),
            code: row.code,
            region: parse_region(&row.region)?,
            scenery: row.scenery,
            utc_offset_hours: row.utc_offset_hours as i8,
            spoken_language: row.spoken_language,
            tags: serde_json::from_value(row.tags).unwrap_or_default(),
            deleted: row.deleted,
            registered_since: row.registered_since,
            update_time: row.update_time,
        })
    }
}

pub fn region_column(region: Region) -> &'static str {
    match region {
        Region::Asia => "ASIA",
        Region::Europe => "EUROPE",
        Region::UsNorth => "US_NORTH",
    }
}

fn parse_region(text: &str) -> Result<Region, DatabaseError> {
    match text {
        "ASIA" => Ok(Region::Asia),
        "EUROPE" => Ok(Region::Europe),
        "US_NORTH" => Ok(Region::UsNorth),
        other => Err(DatabaseError::UnknownColumnValue(other.to_string())),
    }
}

#[derive(sqlx::FromRow)]
pub struct DispatchPostRow {
    pub id: Uuid,
    pub server_id: Uuid,
    pub point_id: Option<Uuid>,
    pub latitude: f64,
    pub longitude: f64,
    pub difficulty: i16,
    pub image_urls: Vec<String>,
    pub deleted: bool,
}

impl From<DispatchPostRow> for DispatchPostEntity {
    fn from(row: DispatchPostRow) -> Self {
        DispatchPostEntity {
            id: Id::new(row.id),
            server_id: Id::new(row.server_id),
            point_id: row.point_id.map(Id::new),
            latitude: row.latitude,
            longitude: row.longitude,
            difficulty: row.difficulty as u8,
            image_urls: row.image_urls,
            deleted: row.deleted,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct JourneyRow {
    pub id: Uuid,
    pub server_id: Uuid,
    pub foreign_run_id: String,
    pub first_seen_time: Option<DateTime<Utc>>,
    pub last_seen_time: Option<DateTime<Utc>>,
    pub cancelled: bool,
    pub continuation_journey_id: Option<Uuid>,
}

impl From<JourneyRow> for JourneyEntity {
    fn from(row: JourneyRow) -> Self {
        JourneyEntity {
            id: Id::new(row.id),
            server_id: Id::new(row.server_id),
            foreign_run_id: row.foreign_run_id,
            first_seen_time: row.first_seen_time,
            last_seen_time: row.last_seen_time,
            cancelled: row.cancelled,
            continuation_journey_id: row.continuation_journey_id.map(Id::new),
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct JourneyEventRow {
    pub id: Uuid,
    pub journey_id: Uuid,
    pub event_index: i32,
    pub event_type: String,
    pub point_id: Option<Uuid>,
    pub in_playable_border: bool,
    pub scheduled_local_time: DateTime<Utc>,
    pub realtime_local_time: Option<DateTime<Utc>>,
    pub precision_type: String,
    pub transport_category: String,
    pub transport_number: String,
    pub transport_line: Option<String>,
    pub transport_label: Option<String>,
    pub transport_type: String,
    pub transport_max_speed_kmh: Option<i32>,
    pub stop_type: String,
    pub scheduled_platform: Option<String>,
    pub scheduled_track: Option<String>,
    pub realtime_platform: Option<String>,
    pub realtime_track: Option<String>,
    pub cancelled: bool,
    pub additional: bool,
}

impl TryFrom<JourneyEventRow> for JourneyEventEntity {
    type Error = DatabaseError;

    fn try_from(row: JourneyEventRow) -> Result<Self, Self::Error> {
        Ok(JourneyEventEntity {
            id: Id::new(row.id),
            journey_id: Id::new(row.journey_id),
            event_index: row.event_index as u32,
            event_type: parse_event_type(&row.event_type)?,
            point_id: row.point_id.map(Id::new),
            in_playable_border: row.in_playable_border,
            scheduled_local_time: row.scheduled_local_time,
            realtime_local_time: row.realtime_local_time,
            precision_type: parse_precision_type(&row.precision_type)?,
            transport: TransportDescriptor {
                category: parse_category(&row.transport_category)?,
                number: row.transport_number,
                line: row.transport_line,
                label: row.transport_label,
                transport_type: row.transport_type,
                max_speed_kmh: row.transport_max_speed_kmh.map(|v| v as u32),
            },
            stop_type: parse_stop_type(&row.stop_type),
            scheduled_platform: row.scheduled_platform,
            scheduled_track: row.scheduled_track,
            realtime_platform: row.realtime_platform,
            realtime_track: row.realtime_track,
            cancelled: row.cancelled,
            additional: row.additional,
        })
    }
}

pub fn event_type_column(event_type: EventType) -> &'static str {
    match event_type {
        EventType::Arrival => "ARRIVAL",
        EventType::Departure => "DEPARTURE",
    }
}

fn parse_event_type(text: &str) -> Result<EventType, DatabaseError> {
    match text {
        "ARRIVAL" => Ok(EventType::Arrival),
        "DEPARTURE" => Ok(EventType::Departure),
        other => Err(DatabaseError::UnknownColumnValue(other.to_string())),
    }
}

pub fn precision_type_column(precision_type: PrecisionType) -> &'static str {
    match precision_type {
        PrecisionType::Schedule => "SCHEDULE",
        PrecisionType::Prediction => "PREDICTION",
        PrecisionType::Real => "REAL",
    }
}

fn parse_precision_type(text: &str) -> Result<PrecisionType, DatabaseError> {
    match text {
        "SCHEDULE" => Ok(PrecisionType::Schedule),
        "PREDICTION" => Ok(PrecisionType::Prediction),
        "REAL" => Ok(PrecisionType::Real),
        other => Err(DatabaseError::UnknownColumnValue(other.to_string())),
    }
}

fn parse_stop_type(text: &str) -> StopType {
    match text {
        "PASSENGER" => StopType::Passenger,
        "NON_PASSENGER" => StopType::NonPassenger,
        _ => StopType::None,
    }
}

pub fn stop_type_column(stop_type: StopType) -> &'static str {
    match stop_type {
        StopType::Passenger => "PASSENGER",
        StopType::NonPassenger => "NON_PASSENGER",
        StopType::None => "NONE",
    }
}

pub fn category_column(category: TransportCategory) -> &'static str {
    use TransportCategory::*;
    match category {
        NationalExpress => "NATIONAL_EXPRESS",
        InterNationalExpress => "INTER_NATIONAL_EXPRESS",
        InterRegionalExpress => "INTER_REGIONAL_EXPRESS",
        InterRegional => "INTER_REGIONAL",
        RegionalFast => "REGIONAL_FAST",
        Regional => "REGIONAL",
        Additional => "ADDITIONAL",
        Maneuver => "MANEUVER",
        EmptyTransfer => "EMPTY_TRANSFER",
        InterNationalCargo => "INTER_NATIONAL_CARGO",
        NationalCargo => "NATIONAL_CARGO",
        Maintenance => "MAINTENANCE",
    }
}

fn parse_category(text: &str) -> Result<TransportCategory, DatabaseError> {
    use TransportCategory::*;
    Ok(match text {
        "NATIONAL_EXPRESS" => NationalExpress,
        "INTER_NATIONAL_EXPRESS" => InterNationalExpress,
        "INTER_REGIONAL_EXPRESS" => InterRegionalExpress,
        "INTER_REGIONAL" => InterRegional,
        "REGIONAL_FAST" => RegionalFast,
        "REGIONAL" => Regional,
        "ADDITIONAL" => Additional,
        "MANEUVER" => Maneuver,
        "EMPTY_TRANSFER" => EmptyTransfer,
        "INTER_NATIONAL_CARGO" => InterNationalCargo,
        "NATIONAL_CARGO" => NationalCargo,
        "MAINTENANCE" => Maintenance,
        other => return Err(DatabaseError::UnknownColumnValue(other.to_string())),
    })
}

#[derive(sqlx::FromRow)]
pub struct VehicleSequenceRow {
    pub id: Uuid,
    pub journey_id: Uuid,
    pub status: String,
    pub railcars: serde_json::Value,
    pub resolve_key_category: String,
    pub resolve_key_number: String,
    pub resolve_key_origin_point_id: Uuid,
    pub resolve_key_destination_point_id: Uuid,
    pub resolve_key_scheduled_departure: DateTime<Utc>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct RailcarRefJson {
    railcar_id: Uuid,
    load_percent: Option<u8>,
    named_locomotive: Option<String>,
}

impl TryFrom<VehicleSequenceRow> for VehicleSequenceEntity {
    type Error = DatabaseError;

    fn try_from(row: VehicleSequenceRow) -> Result<Self, Self::Error> {
        let railcars_json: Vec<RailcarRefJson> = serde_json::from_value(row.railcars).unwrap_or_default();
        Ok(VehicleSequenceEntity {
            id: Id::new(row.id),
            journey_id: Id::new(row.journey_id),
            status: match row.status.as_str() {
                "PREDICTION" => VehicleSequenceStatus::Prediction,
                "REAL" => VehicleSequenceStatus::Real,
                other => return Err(DatabaseError::UnknownColumnValue(other.to_string())),
            },
            railcars: railcars_json
                .into_iter()
                .map(|r| RailcarRef {
                    railcar_id: Id::<Railcar>::new(r.railcar_id),
                    load_percent: r.load_percent,
                    named_locomotive: r.named_locomotive,
                })
                .collect(),
            resolve_key: SequenceResolveKey {
                category: parse_category(&row.resolve_key_category)?,
                number: row.resolve_key_number,
                origin_point_id: Id::<Point>::new(row.resolve_key_origin_point_id),
                destination_point_id: Id::<Point>::new(row.resolve_key_destination_point_id),
                scheduled_departure: row.resolve_key_scheduled_departure,
            },
        })
    }
}

pub fn railcars_json(railcars: &[RailcarRef]) -> serde_json::Value {
    serde_json::to_value(
        railcars
            .iter()
            .map(|r| RailcarRefJson { railcar_id: r.railcar_id.raw(), load_percent: r.load_percent, named_locomotive: r.named_locomotive.clone() })
            .collect::<Vec<_>>(),
    )
    .unwrap_or(serde_json::Value::Array(vec![]))
}

pub fn vehicle_sequence_status_column(status: VehicleSequenceStatus) -> &'static str {
    match status {
        VehicleSequenceStatus::Prediction => "PREDICTION",
        VehicleSequenceStatus::Real => "REAL",
    }
}
