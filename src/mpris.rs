//! MPRIS bridge: exposes the engine on the session bus so desktop media keys
//! and tools like `playerctl` can drive it.

use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use zbus::object_server::SignalEmitter;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::engine::{EngineSnapshot, Phase, SnapshotHandle};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.encore";
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Commands from the outside world (bus or console) for the event loop.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in milliseconds.
    SeekBy(i64),
    /// Absolute seek in milliseconds.
    SeekTo(u64),
    PlayAt(usize),
    Shuffle(bool),
    Status,
    /// Toggle a short interruption by another focus client.
    Interrupt,
    /// Toggle a duckable interruption by another focus client.
    Duck,
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // Nothing to raise.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "encore"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    snapshot: SnapshotHandle,
}

impl PlayerIface {
    fn read(&self) -> EngineSnapshot {
        self.snapshot
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    /// `offset` is in microseconds.
    fn seek(&self, offset: i64) {
        let _ = self.tx.send(ControlCmd::SeekBy(offset / 1_000));
    }

    fn set_position(&self, track_id: OwnedObjectPath, position: i64) {
        let s = self.read();
        let current = track_id_for(s.index);
        if current.as_ref().map(|p| p.as_str()) != Some(track_id.as_str()) {
            debug!(track_id = track_id.as_str(), "SetPosition for a track that is not current");
            return;
        }
        if position < 0 {
            return;
        }
        let ms = position as u64 / 1_000;
        if s.duration_ms.is_some_and(|d| ms > d) {
            return;
        }
        let _ = self.tx.send(ControlCmd::SeekTo(ms));
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        playback_status_of(&self.read())
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        metadata_of(&self.read())
    }

    /// Microseconds.
    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        (self.read().position_ms as i64).saturating_mul(1_000)
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.read().shuffle
    }

    #[zbus(property)]
    fn set_shuffle(&self, value: bool) {
        let _ = self.tx.send(ControlCmd::Shuffle(value));
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        !self.read().playlist.is_empty()
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }
}

fn playback_status_of(s: &EngineSnapshot) -> &'static str {
    match s.phase {
        Phase::Playing | Phase::Preparing(_) => "Playing",
        Phase::Paused => "Paused",
        Phase::Idle => "Stopped",
    }
}

fn track_id_for(index: Option<usize>) -> Option<OwnedObjectPath> {
    let index = index?;
    ObjectPath::try_from(format!("{OBJECT_PATH}/track/{index}"))
        .ok()
        .map(OwnedObjectPath::from)
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

fn put(map: &mut HashMap<String, OwnedValue>, key: &str, value: Value<'_>) {
    if let Ok(v) = OwnedValue::try_from(value) {
        map.insert(key.to_string(), v);
    }
}

fn metadata_of(s: &EngineSnapshot) -> HashMap<String, OwnedValue> {
    let mut map = HashMap::new();
    let Some(track_id) = track_id_for(s.index) else {
        put(
            &mut map,
            "mpris:trackid",
            Value::from(ObjectPath::from_static_str_unchecked(
                "/org/mpris/MediaPlayer2/TrackList/NoTrack",
            )),
        );
        return map;
    };
    put(&mut map, "mpris:trackid", Value::from(track_id.into_inner()));
    put(&mut map, "xesam:title", Value::from(s.title.clone()));
    if let Some(artist) = s.artist.clone() {
        put(&mut map, "xesam:artist", Value::from(vec![artist]));
    }
    if let Some(album) = s.album.clone() {
        put(&mut map, "xesam:album", Value::from(album));
    }
    if let Some(path) = s.current_path() {
        put(&mut map, "xesam:url", Value::from(file_url(path)));
    }
    if let Some(ms) = s.duration_ms {
        put(&mut map, "mpris:length", Value::from((ms as i64).saturating_mul(1_000)));
    }
    map
}

/// What the poller compares to decide which change signals to send.
#[derive(Debug, Clone, PartialEq)]
struct Observed {
    status: &'static str,
    index: Option<usize>,
    title: String,
    duration_ms: Option<u64>,
    shuffle: bool,
}

impl Observed {
    fn of(s: &EngineSnapshot) -> Self {
        Self {
            status: playback_status_of(s),
            index: s.index,
            title: s.title.clone(),
            duration_ms: s.duration_ms,
            shuffle: s.shuffle,
        }
    }
}

/// Serve MPRIS on a background thread. Failing to reach the session bus is
/// logged and otherwise ignored.
pub fn spawn_mpris(tx: Sender<ControlCmd>, snapshot: SnapshotHandle) {
    let spawned = thread::Builder::new()
        .name("mpris".to_string())
        .spawn(move || {
            block_on(async move {
                if let Err(e) = serve(tx, snapshot).await {
                    warn!("MPRIS unavailable: {e}");
                }
            });
        });
    if let Err(e) = spawned {
        warn!("failed to spawn MPRIS thread: {e}");
    }
}

async fn serve(tx: Sender<ControlCmd>, snapshot: SnapshotHandle) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(
            OBJECT_PATH,
            PlayerIface {
                tx,
                snapshot: snapshot.clone(),
            },
        )
        .await?;
    info!(name = BUS_NAME, "MPRIS service registered");

    let iface_ref = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;
    let mut last: Option<Observed> = None;
    loop {
        Timer::after(POLL_INTERVAL).await;
        let now = {
            let Ok(s) = snapshot.lock() else {
                continue;
            };
            Observed::of(&s)
        };
        if last.as_ref() == Some(&now) {
            continue;
        }
        let iface = iface_ref.get().await;
        emit_changes(&*iface, iface_ref.signal_emitter(), last.as_ref(), &now).await;
        last = Some(now);
    }
}

async fn emit_changes(
    iface: &PlayerIface,
    emitter: &SignalEmitter<'_>,
    last: Option<&Observed>,
    now: &Observed,
) {
    if last.is_none_or(|l| l.status != now.status) {
        if let Err(e) = iface.playback_status_changed(emitter).await {
            debug!("PlaybackStatus signal failed: {e}");
        }
    }
    let track_moved = last.is_none_or(|l| {
        l.index != now.index || l.title != now.title || l.duration_ms != now.duration_ms
    });
    if track_moved {
        if let Err(e) = iface.metadata_changed(emitter).await {
            debug!("Metadata signal failed: {e}");
        }
    }
    if last.is_none_or(|l| l.shuffle != now.shuffle) {
        if let Err(e) = iface.shuffle_changed(emitter).await {
            debug!("Shuffle signal failed: {e}");
        }
    }
}
