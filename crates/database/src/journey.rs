use async_trait::async_trait;
use collector::{active_train::JourneyAggregateLoader, timetable::TimetableRepository, vehicle_sequence::VehicleSequenceRepository};
use model::{
    ids::Journey,
    journey::{JourneyAggregate, JourneyEntity},
    journey_event::JourneyEventEntity,
    vehicle_sequence::{SequenceResolveKey, VehicleSequenceEntity},
};
use utility::id::Id;

use crate::{
    rows::{category_column, event_type_column, precision_type_column, railcars_json, stop_type_column, vehicle_sequence_status_column, JourneyEventRow, JourneyRow, VehicleSequenceRow},
    DatabaseError, PgDatabase,
};

impl PgDatabase {
    /// §4.9 `find_events_by_journey`, ordered per §4.5's tie-break rule
    /// (event_index ascending, arrival before departure at a shared time).
    pub async fn find_events_by_journey(&self, journey_id: Id<Journey>) -> Result<Vec<JourneyEventEntity>, DatabaseError> {
        let rows: Vec<JourneyEventRow> = sqlx::query_as(
            "
            SELECT
                id, journey_id, event_index, event_type, point_id, in_playable_border,
                scheduled_local_time, realtime_local_time, precision_type,
                transport_category, transport_number, transport_line, transport_label,
                transport_type, transport_max_speed_kmh, stop_type, scheduled_platform,
                scheduled_track, realtime_platform, realtime_track, cancelled, additional
            FROM journey_events
            WHERE journey_id = $1
            ORDER BY event_index ASC, event_type ASC;
            ",
        )
        .bind(journey_id.raw())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(JourneyEventEntity::try_from).collect()
    }

    async fn find_journey_by_run_id(&self, run_id: &str) -> Result<Option<JourneyRow>, DatabaseError> {
        let row: Option<JourneyRow> = sqlx::query_as(
            "
            SELECT id, server_id, foreign_run_id, first_seen_time, last_seen_time, cancelled, continuation_journey_id
            FROM journeys
            WHERE foreign_run_id = $1;
            ",
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Persists a `JourneyAggregate` as one transaction: upserts the
    /// journey row, replaces its events wholesale (events are always
    /// regenerated from the full aggregate, never patched field-by-field
    /// at this layer), and upserts the vehicle sequence if present (§4.9
    /// "all writes are within a single transaction per reconciled entity").
    pub async fn save_journey_with_events(&self, aggregate: &JourneyAggregate) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "
            INSERT INTO journeys (id, server_id, foreign_run_id, first_seen_time, last_seen_time, cancelled, continuation_journey_id, update_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, now())
            ON CONFLICT (id) DO UPDATE SET
                first_seen_time = EXCLUDED.first_seen_time,
                last_seen_time = EXCLUDED.last_seen_time,
                cancelled = EXCLUDED.cancelled,
                continuation_journey_id = EXCLUDED.continuation_journey_id,
                update_time = now();
            ",
        )
        .bind(aggregate.journey.id.raw())
        .bind(aggregate.journey.server_id.raw())
        .bind(&aggregate.journey.foreign_run_id)
        .bind(aggregate.journey.first_seen_time)
        .bind(aggregate.journey.last_seen_time)
        .bind(aggregate.journey.cancelled)
        .bind(aggregate.journey.continuation_journey_id.map(|id| id.raw()))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM journey_events WHERE journey_id = $1;")
            .bind(aggregate.journey.id.raw())
            .execute(&mut *tx)
            .await?;

        for event in &aggregate.events {
            sqlx::query(
                "
                INSERT INTO journey_events (
                    id, journey_id, event_index, event_type, point_id, in_playable_border,
                    scheduled_local_time, realtime_local_time, precision_type,
                    transport_category, transport_number, transport_line, transport_label,
                    transport_type, transport_max_speed_kmh, stop_type, scheduled_platform,
                    scheduled_track, realtime_platform, realtime_track, cancelled, additional
                ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,$21,$22);
                ",
            )
            .bind(event.id.raw())
            .bind(event.journey_id.raw())
            .bind(event.event_index as i32)
            .bind(event_type_column(event.event_type))
            .bind(event.point_id.map(|id| id.raw()))
            .bind(event.in_playable_border)
            .bind(event.scheduled_local_time)
            .bind(event.realtime_local_time)
            .bind(precision_type_column(event.precision_type))
            .bind(category_column(event.transport.category))
            .bind(&event.transport.number)
            .bind(&event.transport.line)
            .bind(&event.transport.label)
            .bind(&event.transport.transport_type)
            .bind(event.transport.max_speed_kmh.map(|v| v as i32))
            .bind(stop_type_column(event.stop_type))
            .bind(&event.scheduled_platform)
            .bind(&event.scheduled_track)
            .bind(&event.realtime_platform)
            .bind(&event.realtime_track)
            .bind(event.cancelled)
            .bind(event.additional)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(sequence) = &aggregate.vehicle_sequence {
            self.upsert_vehicle_sequence_in(&mut tx, sequence).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn upsert_vehicle_sequence_in(&self, tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, sequence: &VehicleSequenceEntity) -> Result<(), DatabaseError> {
        sqlx::query(
            "
            INSERT INTO vehicle_sequences (
                id, journey_id, status, railcars,
                resolve_key_category, resolve_key_number,
                resolve_key_origin_point_id, resolve_key_destination_point_id, resolve_key_scheduled_departure
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                railcars = EXCLUDED.railcars;
            ",
        )
        .bind(sequence.id.raw())
        .bind(sequence.journey_id.raw())
        .bind(vehicle_sequence_status_column(sequence.status))
        .bind(railcars_json(&sequence.railcars))
        .bind(category_column(sequence.resolve_key.category))
        .bind(&sequence.resolve_key.number)
        .bind(sequence.resolve_key.origin_point_id.raw())
        .bind(sequence.resolve_key.destination_point_id.raw())
        .bind(sequence.resolve_key.scheduled_departure)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TimetableRepository for PgDatabase {
    async fn save_journey_with_events(&self, aggregate: &JourneyAggregate) -> Result<(), String> {
        PgDatabase::save_journey_with_events(self, aggregate).await.map_err(|err| err.to_string())
    }
}

#[async_trait]
impl VehicleSequenceRepository for PgDatabase {
    async fn upsert(&self, sequence: &VehicleSequenceEntity) -> Result<(), String> {
        let mut tx = self.pool.begin().await.map_err(|err| err.to_string())?;
        self.upsert_vehicle_sequence_in(&mut tx, sequence).await.map_err(|err| err.to_string())?;
        tx.commit().await.map_err(|err| err.to_string())?;
        Ok(())
    }

    async fn find_real_by_resolve_key(&self, resolve_key: &SequenceResolveKey) -> Result<Option<VehicleSequenceEntity>, String> {
        let row: Option<VehicleSequenceRow> = sqlx::query_as(
            "
            SELECT id, journey_id, status, railcars, resolve_key_category, resolve_key_number,
                   resolve_key_origin_point_id, resolve_key_destination_point_id, resolve_key_scheduled_departure
            FROM vehicle_sequences
            WHERE status = 'REAL'
              AND resolve_key_category = $1 AND resolve_key_number = $2
              AND resolve_key_origin_point_id = $3 AND resolve_key_destination_point_id = $4
              AND resolve_key_scheduled_departure = $5
            LIMIT 1;
            ",
        )
        .bind(category_column(resolve_key.category))
        .bind(&resolve_key.number)
        .bind(resolve_key.origin_point_id.raw())
        .bind(resolve_key.destination_point_id.raw())
        .bind(resolve_key.scheduled_departure)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| err.to_string())?;

        row.map(VehicleSequenceEntity::try_from).transpose().map_err(|err| err.to_string())
    }
}

#[async_trait]
impl JourneyAggregateLoader for PgDatabase {
    async fn load(&self, journey_id: Id<Journey>, run_id: &str) -> Option<JourneyAggregate> {
        let journey_row = self.find_journey_by_run_id(run_id).await.ok()??;
        if Id::<Journey>::new(journey_row.id) != journey_id {
            return None;
        }
        let events = self.find_events_by_journey(journey_id).await.ok()?;
        Some(JourneyAggregate { journey: JourneyEntity::from(journey_row), events, vehicle_sequence: None })
    }
}
