use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::api::dto::UpsertCellRequest;
use crate::error::AppError;
use crate::models::timetable::is_valid_period;
use crate::models::{ClassForm, Timetable, Weekday};

/// Outcome of saving every occupied cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub saved: usize,
    pub failed: usize,
}

impl SaveReport {
    pub fn is_partial_failure(&self) -> bool {
        self.failed > 0
    }

    /// Does not say which cells failed.
    pub fn message(&self) -> &'static str {
        if self.is_partial_failure() {
            "一部の授業の保存に失敗しました"
        } else {
            "時間割を保存しました"
        }
    }
}

/// The caller's own timetable, mirrored cell by cell with the server.
pub struct TimetableStore {
    api: Arc<dyn ApiClient>,
    timetable: Timetable,
}

impl TimetableStore {
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        Self {
            api,
            timetable: Timetable::new(),
        }
    }

    pub fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    /// Failures leave an empty timetable; they are logged, not returned.
    pub async fn load(&mut self) -> &Timetable {
        self.timetable = match self.api.fetch_timetable().await {
            Ok(records) => Timetable::from_records(records),
            Err(e) => {
                warn!("Failed to load timetable: {}", e);
                Timetable::new()
            }
        };
        &self.timetable
    }

    /// Sends one cell. Transport and server failures are logged and reported as `false`.
    async fn push_cell(&self, day: Weekday, period: u8, form: &ClassForm) -> bool {
        let req = UpsertCellRequest {
            day_of_week: day.key().to_string(),
            period,
            subject_name: form.subject.trim().to_string(),
            room: form.room.trim().to_string(),
        };

        match self.api.upsert_cell(&req).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save {} period {}: {}", day.key(), period, e);
                false
            }
        }
    }

    /// On success the submitted values replace the local cell immediately;
    /// the server-assigned id is only picked up by the next [`load`](Self::load).
    pub async fn save_cell(&mut self, day: Weekday, period: u8, form: ClassForm) -> Result<bool, AppError> {
        if !is_valid_period(period) {
            return Err(AppError::Validation(format!("無効な時限です: {}", period)));
        }
        if form.subject.trim().is_empty() {
            return Err(AppError::Validation("授業名を入力してください".to_string()));
        }

        if !self.push_cell(day, period, &form).await {
            return Ok(false);
        }

        let id = self.timetable.get(day, period).and_then(|e| e.id.clone());
        self.timetable.insert(day, period, form.to_entry(id));
        Ok(true)
    }

    /// Clears the cell by saving it empty.
    pub async fn delete_cell(&mut self, day: Weekday, period: u8) -> Result<bool, AppError> {
        if !is_valid_period(period) {
            return Err(AppError::Validation(format!("無効な時限です: {}", period)));
        }
        if !self.push_cell(day, period, &ClassForm::default()).await {
            return Ok(false);
        }
        self.timetable.remove(day, period);
        Ok(true)
    }

    /// Saves every occupied cell in order, then reloads whatever the outcome.
    pub async fn save_all(&mut self) -> SaveReport {
        let cells: Vec<(Weekday, u8, ClassForm)> = self
            .timetable
            .cells()
            .map(|(day, period, entry)| (day, period, ClassForm::from_entry(entry)))
            .collect();

        let mut report = SaveReport { saved: 0, failed: 0 };
        for (day, period, form) in &cells {
            if self.push_cell(*day, *period, form).await {
                report.saved += 1;
            } else {
                report.failed += 1;
            }
        }

        info!("Saved {} cells, {} failed", report.saved, report.failed);
        self.load().await;
        report
    }
}
