use multiverse_common::ActorId;
use multiverse_transition::{
    Audience, EventSink, JoinMessage, PlayerJoinEvent, SyncSink, SyncUpdate,
};

/// Records every sync update in delivery order.
#[derive(Debug, Default)]
pub struct RecordingSync {
    pub updates: Vec<(ActorId, SyncUpdate)>,
}

impl RecordingSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kinds of the recorded updates, in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.updates.iter().map(|(_, u)| u.kind()).collect()
    }

    pub fn find(&self, kind: &str) -> Option<&SyncUpdate> {
        self.updates
            .iter()
            .map(|(_, u)| u)
            .find(|u| u.kind() == kind)
    }
}

impl SyncSink for RecordingSync {
    fn send(&mut self, actor: ActorId, update: SyncUpdate) {
        self.updates.push((actor, update));
    }
}

type Rewrite = Box<dyn FnMut(&mut PlayerJoinEvent)>;

/// Records join events and broadcasts, optionally rewriting each join event.
#[derive(Default)]
pub struct RecordingEvents {
    pub joins: Vec<PlayerJoinEvent>,
    pub broadcasts: Vec<(Audience, JoinMessage)>,
    rewrite: Option<Rewrite>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener applied to every posted join event before it is recorded.
    pub fn rewriting(rewrite: impl FnMut(&mut PlayerJoinEvent) + 'static) -> Self {
        Self {
            rewrite: Some(Box::new(rewrite)),
            ..Self::default()
        }
    }
}

impl EventSink for RecordingEvents {
    fn post_join(&mut self, event: &mut PlayerJoinEvent) {
        if let Some(rewrite) = self.rewrite.as_mut() {
            rewrite(event);
        }
        self.joins.push(event.clone());
    }

    fn broadcast(&mut self, audience: &Audience, message: &JoinMessage) {
        self.broadcasts.push((audience.clone(), message.clone()));
    }
}
