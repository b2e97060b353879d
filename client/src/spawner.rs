//! Money-clicker spawn scheduling.
//!
//! One self-rescheduling task: wait a uniform random interval, make one
//! weighted spawn attempt, repeat. Spawned items live on a 2D field and
//! expire on their own; clicks arrive as commands, remove the item, and
//! credit its value through the backend. The embedding UI drains
//! [`SpawnEvent`]s from an mpsc channel.

use crate::BalanceBackend;
use parlor_types::api::ClickedItem;
use parlor_types::items::{ItemKind, ITEM_KINDS};
use parlor_types::{Amount, DOLLAR_BILL_KIND};
use rand::Rng;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

/// Bounds of the uniform wait between spawn attempts.
pub const SPAWN_WAIT_MIN: Duration = Duration::from_millis(2500);
pub const SPAWN_WAIT_MAX: Duration = Duration::from_millis(10_000);

/// Items keep this far from the field edges.
const FIELD_OFFSET: f64 = 40.0;
const FIELD_MARGIN: f64 = 80.0;
/// Exclusion radius around the field center (where the dollar bill sits).
const CENTER_EXCLUSION: f64 = 200.0;
/// Placement retries before accepting a too-central position.
const PLACEMENT_ATTEMPTS: usize = 10;

/// The spawnable area, in pixels.
#[derive(Clone, Copy, Debug)]
pub struct Field {
    pub width: f64,
    pub height: f64,
}

/// Instructions from the embedding UI.
#[derive(Clone, Copy, Debug)]
pub enum SpawnCommand {
    /// A spawned item was clicked.
    Click(u64),
    /// The base dollar bill was clicked.
    DollarBill,
    /// Cancel the pending timer and schedule nothing further.
    Stop,
}

/// State changes for the embedding UI.
#[derive(Clone, Debug)]
pub enum SpawnEvent {
    Spawned {
        id: u64,
        kind: &'static ItemKind,
        x: f64,
        y: f64,
    },
    /// The item's lifetime ran out unclicked.
    Expired { id: u64 },
    /// The item was clicked; the credit follows as a `Balance` event.
    Clicked {
        id: u64,
        name: &'static str,
        value: Amount,
        sound: &'static str,
    },
    Balance(Amount),
    /// A credit call failed; the displayed balance is unchanged.
    BackendError(String),
}

/// Caller's side of a running scheduler.
pub struct SpawnerHandle {
    pub commands: mpsc::Sender<SpawnCommand>,
    pub events: mpsc::Receiver<SpawnEvent>,
}

struct Active {
    id: u64,
    kind: &'static ItemKind,
    expires_at: Instant,
}

/// The spawn loop. Construct with [`SpawnScheduler::new`], then drive it
/// with [`SpawnScheduler::run`] on a task.
pub struct SpawnScheduler<B, R> {
    state: State<B, R>,
    commands: mpsc::Receiver<SpawnCommand>,
}

struct State<B, R> {
    backend: B,
    rng: R,
    field: Field,
    events: mpsc::Sender<SpawnEvent>,
    active: Vec<Active>,
    next_id: u64,
}

impl<B: BalanceBackend, R: Rng> SpawnScheduler<B, R> {
    pub fn new(backend: B, rng: R, field: Field) -> (Self, SpawnerHandle) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (event_tx, event_rx) = mpsc::channel(64);
        let scheduler = Self {
            state: State {
                backend,
                rng,
                field,
                events: event_tx,
                active: Vec::new(),
                next_id: 0,
            },
            commands: command_rx,
        };
        let handle = SpawnerHandle {
            commands: command_tx,
            events: event_rx,
        };
        (scheduler, handle)
    }

    /// Run until stopped or the command channel closes.
    pub async fn run(mut self) {
        let mut next_spawn = Instant::now() + self.state.spawn_wait();
        loop {
            let wake = self
                .state
                .active
                .iter()
                .map(|item| item.expires_at)
                .chain([next_spawn])
                .min()
                .unwrap_or(next_spawn);
            tokio::select! {
                _ = time::sleep_until(wake) => {
                    self.state.expire_due().await;
                    if Instant::now() >= next_spawn {
                        self.state.attempt_spawn().await;
                        next_spawn = Instant::now() + self.state.spawn_wait();
                    }
                }
                command = self.commands.recv() => match command {
                    Some(SpawnCommand::Click(id)) => self.state.click(id).await,
                    Some(SpawnCommand::DollarBill) => self.state.dollar_bill().await,
                    Some(SpawnCommand::Stop) | None => return,
                },
            }
        }
    }
}

impl<B: BalanceBackend, R: Rng> State<B, R> {
    fn spawn_wait(&mut self) -> Duration {
        Duration::from_millis(
            self.rng
                .gen_range(SPAWN_WAIT_MIN.as_millis() as u64..SPAWN_WAIT_MAX.as_millis() as u64),
        )
    }

    async fn expire_due(&mut self) {
        let now = Instant::now();
        let mut index = 0;
        while index < self.active.len() {
            if self.active[index].expires_at <= now {
                let item = self.active.swap_remove(index);
                let _ = self.events.send(SpawnEvent::Expired { id: item.id }).await;
            } else {
                index += 1;
            }
        }
    }

    async fn attempt_spawn(&mut self) {
        let roll = self.rng.gen_range(0.0..100.0);
        self.attempt_spawn_with(roll).await;
    }

    async fn attempt_spawn_with(&mut self, roll: f64) {
        let Some(kind) = pick_kind(roll) else {
            tracing::debug!(roll, "no spawn");
            return;
        };
        let visible = self.active.iter().filter(|item| item.kind.id == kind.id).count();
        if visible >= kind.spawn_limit {
            tracing::debug!(kind = kind.id, "spawn cap reached");
            return;
        }

        let (x, y) = place(&mut self.rng, &self.field);
        let id = self.next_id;
        self.next_id += 1;
        self.active.push(Active {
            id,
            kind,
            expires_at: Instant::now() + kind.lifetime,
        });
        let _ = self
            .events
            .send(SpawnEvent::Spawned { id, kind, x, y })
            .await;
    }

    async fn click(&mut self, id: u64) {
        // Clicks racing an expiry can miss; the item is simply gone.
        let Some(index) = self.active.iter().position(|item| item.id == id) else {
            return;
        };
        let item = self.active.swap_remove(index);
        let _ = self
            .events
            .send(SpawnEvent::Clicked {
                id,
                name: item.kind.name,
                value: item.kind.value,
                sound: item.kind.sound,
            })
            .await;

        let descriptor = ClickedItem::Descriptor {
            name: item.kind.name.to_string(),
            value: item.kind.value,
        };
        self.credit(&descriptor).await;
    }

    async fn dollar_bill(&mut self) {
        self.credit(&ClickedItem::Kind(DOLLAR_BILL_KIND.to_string()))
            .await;
    }

    async fn credit(&mut self, item: &ClickedItem) {
        match self.backend.click(item).await {
            Ok(response) => {
                let _ = self.events.send(SpawnEvent::Balance(response.balance)).await;
            }
            Err(err) => {
                tracing::warn!(%err, "click credit failed");
                let _ = self
                    .events
                    .send(SpawnEvent::BackendError(err.to_string()))
                    .await;
            }
        }
    }
}

/// Weighted kind selection: one roll in [0, 100) against cumulative
/// weights; a roll beyond the total is the no-spawn outcome.
fn pick_kind(roll: f64) -> Option<&'static ItemKind> {
    let mut cumulative = 0.0;
    for kind in &ITEM_KINDS {
        cumulative += f64::from(kind.weight);
        if roll <= cumulative {
            return Some(kind);
        }
    }
    None
}

/// Uniform position within the margins, retried to clear the center
/// exclusion and accepted anyway once the attempts run out.
fn place(rng: &mut impl Rng, field: &Field) -> (f64, f64) {
    let mut x = FIELD_OFFSET;
    let mut y = FIELD_OFFSET;
    for _ in 0..PLACEMENT_ATTEMPTS {
        x = axis(rng, field.width);
        y = axis(rng, field.height);
        if !too_central(x, y, field) {
            break;
        }
    }
    (x, y)
}

fn axis(rng: &mut impl Rng, extent: f64) -> f64 {
    let span = extent - FIELD_MARGIN;
    if span > 0.0 {
        rng.gen_range(0.0..span) + FIELD_OFFSET
    } else {
        FIELD_OFFSET
    }
}

fn too_central(x: f64, y: f64, field: &Field) -> bool {
    let dx = x - field.width / 2.0;
    let dy = y - field.height / 2.0;
    (dx * dx + dy * dy).sqrt() < CENTER_EXCLUSION
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use parlor_types::api::ClickResponse;
    use parlor_types::items::{DIAMOND, GOLD_COIN, RUBY};
    use parlor_types::{BalanceAction, STARTING_BALANCE};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::{Arc, Mutex};

    struct FakeBackend {
        balance: Mutex<Amount>,
    }

    impl FakeBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                balance: Mutex::new(STARTING_BALANCE),
            })
        }
    }

    impl BalanceBackend for Arc<FakeBackend> {
        async fn balance(&self) -> Result<Amount> {
            Ok(*self.balance.lock().unwrap())
        }

        async fn update(&self, _wager: Amount, _action: BalanceAction) -> Result<Amount> {
            unreachable!("the spawner never bets")
        }

        async fn click(&self, item: &ClickedItem) -> Result<ClickResponse> {
            let (name, value) = match item {
                ClickedItem::Kind(id) if id == DOLLAR_BILL_KIND => {
                    ("Dollar bill".to_string(), Amount::from_dollars(1))
                }
                ClickedItem::Kind(id) => panic!("unexpected kind: {id}"),
                ClickedItem::Descriptor { name, value } => (name.clone(), *value),
            };
            let mut balance = self.balance.lock().unwrap();
            *balance = balance.checked_add(value).unwrap();
            Ok(ClickResponse {
                balance: *balance,
                amount: value,
                item_name: name,
                message: String::new(),
            })
        }
    }

    fn field() -> Field {
        Field {
            width: 1200.0,
            height: 800.0,
        }
    }

    #[test]
    fn kind_selection_follows_cumulative_weights() {
        assert_eq!(pick_kind(0.0), Some(&GOLD_COIN));
        assert_eq!(pick_kind(50.0), Some(&GOLD_COIN));
        assert_eq!(pick_kind(50.1), Some(&RUBY));
        assert_eq!(pick_kind(60.0), Some(&RUBY));
        assert_eq!(pick_kind(61.5), Some(&DIAMOND));
        assert_eq!(pick_kind(62.1), None);
        assert_eq!(pick_kind(99.9), None);
    }

    #[test]
    fn placement_respects_margins_and_the_center_exclusion() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let field = field();
        for _ in 0..200 {
            let (x, y) = place(&mut rng, &field);
            assert!(x >= FIELD_OFFSET && x <= field.width - FIELD_MARGIN + FIELD_OFFSET);
            assert!(y >= FIELD_OFFSET && y <= field.height - FIELD_MARGIN + FIELD_OFFSET);
            assert!(!too_central(x, y, &field));
        }
    }

    #[test]
    fn cramped_fields_place_anyway() {
        // Every position is within 200px of the center; the tenth
        // attempt is accepted regardless.
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let field = Field {
            width: 300.0,
            height: 300.0,
        };
        let (x, y) = place(&mut rng, &field);
        assert!(too_central(x, y, &field));
    }

    #[tokio::test(start_paused = true)]
    async fn spawns_within_the_interval_and_expires_after_lifetime() {
        let backend = FakeBackend::new();
        let (scheduler, mut handle) =
            SpawnScheduler::new(Arc::clone(&backend), ChaCha8Rng::seed_from_u64(9), field());
        let task = tokio::spawn(scheduler.run());

        let started = Instant::now();
        let (spawn_id, spawned_at) = loop {
            match handle.events.recv().await.unwrap() {
                SpawnEvent::Spawned { id, .. } => break (id, Instant::now()),
                other => panic!("unexpected event before first spawn: {other:?}"),
            }
        };
        let waited = spawned_at - started;
        assert!(waited >= SPAWN_WAIT_MIN, "waited {waited:?}");

        // Unclicked, the item expires after its configured lifetime.
        loop {
            match handle.events.recv().await.unwrap() {
                SpawnEvent::Expired { id } if id == spawn_id => break,
                SpawnEvent::Spawned { .. } => continue,
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert!(Instant::now() - spawned_at >= GOLD_COIN.lifetime);

        handle.commands.send(SpawnCommand::Stop).await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn clicking_an_item_credits_its_value() {
        let backend = FakeBackend::new();
        let (scheduler, mut handle) =
            SpawnScheduler::new(Arc::clone(&backend), ChaCha8Rng::seed_from_u64(9), field());
        let task = tokio::spawn(scheduler.run());

        let (id, kind) = loop {
            match handle.events.recv().await.unwrap() {
                SpawnEvent::Spawned { id, kind, .. } => break (id, kind),
                other => panic!("unexpected event: {other:?}"),
            }
        };
        handle.commands.send(SpawnCommand::Click(id)).await.unwrap();

        let mut clicked = false;
        let balance = loop {
            match handle.events.recv().await.unwrap() {
                SpawnEvent::Clicked { id: clicked_id, value, .. } => {
                    assert_eq!(clicked_id, id);
                    assert_eq!(value, kind.value);
                    clicked = true;
                }
                SpawnEvent::Balance(balance) => break balance,
                SpawnEvent::Spawned { .. } | SpawnEvent::Expired { .. } => continue,
                other => panic!("unexpected event: {other:?}"),
            }
        };
        assert!(clicked);
        assert_eq!(balance, STARTING_BALANCE.checked_add(kind.value).unwrap());

        handle.commands.send(SpawnCommand::Stop).await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn dollar_bill_clicks_go_through_the_backend() {
        let backend = FakeBackend::new();
        let (scheduler, mut handle) =
            SpawnScheduler::new(Arc::clone(&backend), ChaCha8Rng::seed_from_u64(9), field());
        let task = tokio::spawn(scheduler.run());

        handle.commands.send(SpawnCommand::DollarBill).await.unwrap();
        loop {
            match handle.events.recv().await.unwrap() {
                SpawnEvent::Balance(balance) => {
                    assert_eq!(
                        balance,
                        STARTING_BALANCE.checked_add(Amount::from_dollars(1)).unwrap()
                    );
                    break;
                }
                SpawnEvent::Spawned { .. } => continue,
                other => panic!("unexpected event: {other:?}"),
            }
        }

        handle.commands.send(SpawnCommand::Stop).await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn spawn_caps_hold_per_kind() {
        let backend = FakeBackend::new();
        let (mut scheduler, mut handle) =
            SpawnScheduler::new(Arc::clone(&backend), ChaCha8Rng::seed_from_u64(9), field());

        // Diamond's cumulative band caps at one visible instance.
        scheduler.state.attempt_spawn_with(61.0).await;
        scheduler.state.attempt_spawn_with(61.0).await;

        let mut spawned = 0;
        while let Ok(event) = handle.events.try_recv() {
            if let SpawnEvent::Spawned { kind, .. } = event {
                assert_eq!(kind.id, DIAMOND.id);
                spawned += 1;
            }
        }
        assert_eq!(spawned, 1);
    }
}
