use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDto {
    pub id: String,
    pub code: String,
    pub region: String,
    pub scenery: String,
    pub is_online: bool,
    pub spoken_language: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffsetDto {
    pub server_code: String,
    pub utc_offset_hours: i8,
    pub timezone_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchPostDto {
    pub id: String,
    pub point_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub difficulty_level: u8,
    pub image_url_list: Vec<String>,
    pub dispatchers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalDto {
    pub name: String,
    pub distance_m: f64,
    pub speed_limit_kmh: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTrainDto {
    pub run_id: String,
    pub train_number: String,
    pub train_type: String,
    pub speed_kmh: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub driver_id: Option<String>,
    pub point_name: Option<String>,
    pub previous_point_name: Option<String>,
    pub next_signal: Option<SignalDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEventDto {
    pub point_name: String,
    pub arrival_time: Option<String>,
    pub departure_time: Option<String>,
    pub scheduled_platform: Option<String>,
    pub scheduled_track: Option<String>,
    pub stop_type: String,
    pub train_type: String,
    pub train_number: String,
    pub line: Option<String>,
    pub label: Option<String>,
    pub max_speed_kmh: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableDto {
    pub run_id: String,
    pub continues_as: Option<String>,
    pub events: Vec<TimetableEventDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RailcarRefDto {
    pub railcar_api_id: String,
    pub load_percent: Option<u8>,
    pub named_locomotive: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSequenceDto {
    pub run_id: String,
    pub railcars: Vec<RailcarRefDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDto {
    pub platform_id: String,
    pub display_name: String,
}
