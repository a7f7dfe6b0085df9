// Beat timers - Cancellable repeating schedules that drive the engine

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Work run on every tick of a schedule
pub type BeatTask = Box<dyn FnMut() + Send + 'static>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("Timer interval must be greater than zero")]
    ZeroInterval,

    #[error("Failed to start beat timer thread: {0}")]
    Spawn(String),
}

/// A timer holding at most one repeating schedule
///
/// `schedule_repeating` replaces whatever was pending. The first run happens
/// one full interval after scheduling, like a periodic timer. A failed
/// schedule leaves nothing pending.
pub trait RepeatingTimer: Send {
    fn schedule_repeating(
        &mut self,
        interval: Duration,
        task: BeatTask,
    ) -> Result<(), TimerError>;

    fn cancel(&mut self);

    fn is_scheduled(&self) -> bool;
}

/// Wall-clock timer running each schedule on a background thread
///
/// Deadlines are computed from the schedule start (`start + n * interval`)
/// so slow tasks do not accumulate drift. Deadlines missed while a task ran
/// late are skipped, not replayed, so a stall costs beats instead of
/// producing a burst.
#[derive(Default)]
pub struct ThreadTimer {
    active: Option<ActiveSchedule>,
}

struct ActiveSchedule {
    cancelled: Arc<AtomicBool>,
    thread: thread::Thread,
}

impl ThreadTimer {
    pub fn new() -> Self {
        Self { active: None }
    }
}

impl RepeatingTimer for ThreadTimer {
    fn schedule_repeating(
        &mut self,
        interval: Duration,
        mut task: BeatTask,
    ) -> Result<(), TimerError> {
        self.cancel();
        if interval.is_zero() {
            return Err(TimerError::ZeroInterval);
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let spawned = thread::Builder::new()
            .name("beat-timer".to_string())
            .spawn(move || {
                let mut deadline = Instant::now() + interval;
                loop {
                    loop {
                        if flag.load(Ordering::Acquire) {
                            return;
                        }
                        let now = Instant::now();
                        if now >= deadline {
                            break;
                        }
                        thread::park_timeout(deadline - now);
                    }
                    task();
                    deadline += interval;
                    let now = Instant::now();
                    while deadline <= now {
                        deadline += interval;
                    }
                }
            })
            .map_err(|e| TimerError::Spawn(e.to_string()))?;

        self.active = Some(ActiveSchedule {
            cancelled,
            thread: spawned.thread().clone(),
        });
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancelled.store(true, Ordering::Release);
            active.thread.unpark();
        }
    }

    fn is_scheduled(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Default)]
struct ManualSlot {
    interval: Option<Duration>,
    task: Option<BeatTask>,
    generation: u64,
    history: Vec<Duration>,
    elapsed: Duration,
}

/// Deterministic timer advanced by hand
///
/// Clones share the same schedule, so one clone can be handed to the engine
/// while another fires ticks. Virtual time advances by the current interval
/// on every `fire`.
#[derive(Clone, Default)]
pub struct ManualTimer {
    slot: Arc<Mutex<ManualSlot>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Interval of the pending schedule
    pub fn interval(&self) -> Option<Duration> {
        self.lock().interval
    }

    /// Every interval scheduled so far, oldest first
    pub fn history(&self) -> Vec<Duration> {
        self.lock().history.clone()
    }

    /// Virtual time consumed by fired ticks
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    /// Run the pending task once. Returns false when nothing is scheduled.
    pub fn fire(&self) -> bool {
        let (mut task, generation) = {
            let mut slot = self.lock();
            let Some(interval) = slot.interval else {
                return false;
            };
            let Some(task) = slot.task.take() else {
                return false;
            };
            slot.elapsed += interval;
            (task, slot.generation)
        };

        // Slot unlocked: the task may reschedule or cancel
        task();

        let mut slot = self.lock();
        if slot.generation == generation && slot.task.is_none() {
            slot.task = Some(task);
        }
        true
    }

    /// Fire up to `count` times, stopping early if the schedule goes away
    pub fn fire_times(&self, count: usize) -> usize {
        (0..count).take_while(|_| self.fire()).count()
    }

    /// Fire until nothing is scheduled, bounded by `limit` ticks
    pub fn run_until_idle(&self, limit: usize) -> usize {
        self.fire_times(limit)
    }
}

impl RepeatingTimer for ManualTimer {
    fn schedule_repeating(
        &mut self,
        interval: Duration,
        task: BeatTask,
    ) -> Result<(), TimerError> {
        self.cancel();
        if interval.is_zero() {
            return Err(TimerError::ZeroInterval);
        }
        let mut slot = self.lock();
        slot.generation += 1;
        slot.interval = Some(interval);
        slot.task = Some(task);
        slot.history.push(interval);
        Ok(())
    }

    fn cancel(&mut self) {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.interval = None;
        slot.task = None;
    }

    fn is_scheduled(&self) -> bool {
        self.lock().interval.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_task(counter: &Arc<AtomicUsize>) -> BeatTask {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_manual_timer_fires_pending_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut timer = ManualTimer::new();
        let handle = timer.clone();

        assert!(!handle.fire());

        timer
            .schedule_repeating(Duration::from_millis(500), counting_task(&counter))
            .unwrap();
        assert!(handle.is_scheduled());
        assert_eq!(handle.fire_times(3), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(handle.elapsed(), Duration::from_millis(1500));
    }

    #[test]
    fn test_manual_timer_cancel_and_replace() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut timer = ManualTimer::new();

        timer
            .schedule_repeating(Duration::from_millis(600), counting_task(&first))
            .unwrap();
        timer
            .schedule_repeating(Duration::from_millis(400), counting_task(&second))
            .unwrap();
        timer.fire();
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(
            timer.history(),
            vec![Duration::from_millis(600), Duration::from_millis(400)]
        );

        timer.cancel();
        assert!(!timer.is_scheduled());
        assert!(!timer.fire());
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_manual_timer_task_can_cancel_itself() {
        let timer = ManualTimer::new();
        let mut inner = timer.clone();
        let mut engine_side = timer.clone();
        engine_side
            .schedule_repeating(
                Duration::from_millis(100),
                Box::new(move || inner.cancel()),
            )
            .unwrap();

        assert!(timer.fire());
        assert!(!timer.is_scheduled());
        assert_eq!(timer.run_until_idle(10), 0);
    }

    #[test]
    fn test_thread_timer_ticks_and_cancels() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut timer = ThreadTimer::new();

        timer
            .schedule_repeating(Duration::from_millis(10), counting_task(&counter))
            .unwrap();
        assert!(timer.is_scheduled());
        thread::sleep(Duration::from_millis(120));
        timer.cancel();
        assert!(!timer.is_scheduled());

        let fired = counter.load(Ordering::SeqCst);
        assert!(fired >= 3, "expected several ticks, got {}", fired);

        thread::sleep(Duration::from_millis(50));
        let after_cancel = counter.load(Ordering::SeqCst);
        // At most one tick already in flight when cancel landed
        assert!(after_cancel <= fired + 1);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(counter.load(Ordering::SeqCst), after_cancel);
    }

    #[test]
    fn test_thread_timer_first_tick_waits_one_interval() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut timer = ThreadTimer::new();

        timer
            .schedule_repeating(Duration::from_millis(200), counting_task(&counter))
            .unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        timer.cancel();
    }
    #[test]
    fn test_zero_interval_is_rejected() {
        let counter = Arc::new(AtomicUsize::new(0));

        let mut manual = ManualTimer::new();
        assert_eq!(
            manual.schedule_repeating(Duration::ZERO, counting_task(&counter)),
            Err(TimerError::ZeroInterval)
        );
        assert!(!manual.is_scheduled());

        let mut threaded = ThreadTimer::new();
        assert_eq!(
            threaded.schedule_repeating(Duration::ZERO, counting_task(&counter)),
            Err(TimerError::ZeroInterval)
        );
        assert!(!threaded.is_scheduled());
    }

    #[test]
    fn test_thread_timer_skips_ticks_missed_during_slow_task() {
        let fires = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&fires);
        let mut timer = ThreadTimer::new();

        timer
            .schedule_repeating(
                Duration::from_millis(20),
                Box::new(move || {
                    let mut fires = recorded.lock().unwrap();
                    fires.push(Instant::now());
                    let first = fires.len() == 1;
                    drop(fires);
                    // First tick stalls for ten intervals
                    if first {
                        thread::sleep(Duration::from_millis(200));
                    }
                }),
            )
            .unwrap();
        thread::sleep(Duration::from_millis(400));
        timer.cancel();

        let fires = fires.lock().unwrap().clone();
        assert!(fires.len() >= 3, "expected ticks after the stall, got {}", fires.len());
        let back_to_back = fires
            .windows(2)
            .filter(|pair| pair[1] - pair[0] < Duration::from_millis(2))
            .count();
        assert_eq!(back_to_back, 0, "missed ticks were replayed");
        // 400ms at 20ms would be 20 ticks; the stall swallows about ten
        assert!(fires.len() <= 14, "too many ticks: {}", fires.len());
    }
}
