use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::models::{ClassStatus, Timetable, resolve_status};

pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub fn local_clock() -> Clock {
    Arc::new(|| chrono::Local::now().naive_local())
}

/// Re-evaluates the owner's status on every tick and whenever the schedule
/// changes. The task is aborted when the handle is dropped.
pub struct StatusTicker {
    handle: JoinHandle<()>,
}

impl StatusTicker {
    pub fn spawn(
        schedule: watch::Receiver<Timetable>,
        clock: Clock,
        interval: Duration,
    ) -> (Self, watch::Receiver<ClassStatus>) {
        let initial = resolve_status(clock(), &schedule.borrow());
        let (tx, rx) = watch::channel(initial);

        info!("Starting status ticker (interval: {:?})", interval);
        let handle = tokio::spawn(run(schedule, clock, interval, tx));

        (Self { handle }, rx)
    }

    pub fn every_second(schedule: watch::Receiver<Timetable>) -> (Self, watch::Receiver<ClassStatus>) {
        Self::spawn(schedule, local_clock(), Duration::from_secs(1))
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for StatusTicker {
    fn drop(&mut self) {
        debug!("Stopping status ticker");
        self.handle.abort();
    }
}

async fn run(
    mut schedule: watch::Receiver<Timetable>,
    clock: Clock,
    interval: Duration,
    tx: watch::Sender<ClassStatus>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = schedule.changed() => {
                // スケジュール側が閉じたら終了
                if changed.is_err() {
                    break;
                }
            }
        }

        let status = resolve_status(clock(), &schedule.borrow_and_update());
        tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });

        if tx.is_closed() {
            break;
        }
    }
}
