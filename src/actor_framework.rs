use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::storage::{PersistenceEvent, SlotStorage, StorageError};

/// How many times the actor asks for a fresh id before giving up on a create.
pub const MAX_ID_ATTEMPTS: usize = 16;

// =============================================================================
// 1. THE ABSTRACTION (Entity trait with hooks, patches and actions)
// =============================================================================

/// Trait that any domain entity must implement to be managed by [`ResourceActor`].
///
/// Entities are serialized as a whole into the actor's durable slot, so they
/// and their ids must round-trip through JSON.
pub trait Entity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + Serialize + DeserializeOwned;
    type CreateParams: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;
    type Action: Send + Sync + Debug;
    type ActionResult: Send + Sync + Debug;
    type Error: std::error::Error + From<FrameworkError> + Send + Sync + 'static;

    fn id(&self) -> &Self::Id;

    /// Construct (and validate) the full entity from a freshly generated id.
    fn from_create_params(id: Self::Id, params: Self::CreateParams) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_update(&mut self, patch: Self::Patch) -> Result<(), Self::Error>;

    // --- Action Handler ---

    /// Handle a domain-specific action. On `Err` the actor discards every
    /// change made to `self`.
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, Self::Error>;
}

/// Failures raised by the framework itself rather than by entity logic.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("No unused id after {0} attempts")]
    IdExhausted(usize),
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped")]
    ActorDropped,
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<R, E> = oneshot::Sender<Result<R, E>>;

#[derive(Debug)]
pub enum ResourceRequest<T: Entity> {
    Create {
        params: T::CreateParams,
        respond_to: Response<T, T::Error>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>, T::Error>,
    },
    List {
        respond_to: Response<Vec<T>, T::Error>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T, T::Error>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult, T::Error>,
    },
    Clear {
        respond_to: Response<usize, T::Error>,
    },
    Shutdown {
        respond_to: Response<(), T::Error>,
    },
}

// =============================================================================
// 3. THE DURABLE SLOT
// =============================================================================

/// The single named entry an actor loads from and writes its whole store to.
pub struct Slot {
    storage: Box<dyn SlotStorage>,
    key: String,
}

impl Slot {
    pub fn new(storage: impl SlotStorage, key: impl Into<String>) -> Self {
        Self {
            storage: Box::new(storage),
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn load<T: Entity>(&self) -> Result<HashMap<T::Id, T>, StorageError> {
        match self.storage.read(&self.key)? {
            Some(blob) => serde_json::from_str(&blob).map_err(|source| StorageError::Codec {
                key: self.key.clone(),
                source,
            }),
            None => Ok(HashMap::new()),
        }
    }

    fn save<T: Entity>(&mut self, store: &HashMap<T::Id, T>) -> Result<(), StorageError> {
        let blob = serde_json::to_string(store).map_err(|source| StorageError::Codec {
            key: self.key.clone(),
            source,
        })?;
        self.storage.write(&self.key, &blob)
    }
}

// =============================================================================
// 4. THE GENERIC ACTOR SERVER
// =============================================================================

pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
    slot: Slot,
    events: Option<mpsc::UnboundedSender<PersistenceEvent>>,
}

impl<T: Entity> ResourceActor<T> {
    /// Builds the actor and loads its store from `slot`.
    ///
    /// A slot that cannot be read or decoded is logged and reported as
    /// [`PersistenceEvent::LoadFailed`]; the actor then starts empty.
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
        slot: Slot,
        events: Option<mpsc::UnboundedSender<PersistenceEvent>>,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let mut actor = Self {
            receiver,
            store: HashMap::new(),
            next_id_fn: Box::new(next_id_fn),
            slot,
            events,
        };
        actor.load();
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    pub async fn run(mut self) {
        info!(slot = %self.slot.key(), entries = self.store.len(), "ResourceActor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    let _ = respond_to.send(self.handle_create(params));
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List { respond_to } => {
                    let items = self.store.values().cloned().collect();
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::Update { id, patch, respond_to } => {
                    let _ = respond_to.send(self.handle_update(id, patch));
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    let _ = respond_to.send(self.handle_action(id, action));
                }
                ResourceRequest::Clear { respond_to } => {
                    let removed = self.store.len();
                    self.store.clear();
                    self.persist();
                    info!(removed, "Store cleared");
                    let _ = respond_to.send(Ok(removed));
                }
                ResourceRequest::Shutdown { respond_to } => {
                    self.persist();
                    let _ = respond_to.send(Ok(()));
                    break;
                }
            }
        }
        info!(slot = %self.slot.key(), "ResourceActor stopped");
    }

    fn handle_create(&mut self, params: T::CreateParams) -> Result<T, T::Error> {
        let id = self.fresh_id()?;
        let mut item = T::from_create_params(id.clone(), params)?;
        item.on_create()?;
        self.store.insert(id, item.clone());
        self.persist();
        Ok(item)
    }

    fn handle_update(&mut self, id: T::Id, patch: T::Patch) -> Result<T, T::Error> {
        let item = self
            .store
            .get_mut(&id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        let mut draft = item.clone();
        draft.on_update(patch)?;
        *item = draft.clone();
        self.persist();
        Ok(draft)
    }

    fn handle_action(&mut self, id: T::Id, action: T::Action) -> Result<T::ActionResult, T::Error> {
        let item = self
            .store
            .get_mut(&id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        let mut draft = item.clone();
        let result = draft.handle_action(action)?;
        *item = draft;
        self.persist();
        Ok(result)
    }

    fn fresh_id(&self) -> Result<T::Id, FrameworkError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = (self.next_id_fn)();
            if !self.store.contains_key(&id) {
                return Ok(id);
            }
            debug!(%id, "Generated id already in use, retrying");
        }
        Err(FrameworkError::IdExhausted(MAX_ID_ATTEMPTS))
    }

    fn load(&mut self) {
        let key = self.slot.key().to_string();
        match self.slot.load::<T>() {
            Ok(store) => {
                info!(slot = %key, count = store.len(), "Loaded slot");
                self.emit(PersistenceEvent::Loaded { key, count: store.len() });
                self.store = store;
            }
            Err(e) => {
                error!(slot = %key, error = %e, "Failed to load slot, starting empty");
                self.emit(PersistenceEvent::LoadFailed { key, error: e.to_string() });
            }
        }
    }

    /// Writes the whole store back. Failures are logged and published, never
    /// returned: the in-memory store stays authoritative.
    fn persist(&mut self) {
        let key = self.slot.key().to_string();
        let count = self.store.len();
        match self.slot.save(&self.store) {
            Ok(()) => {
                debug!(slot = %key, count, "Persisted slot");
                self.emit(PersistenceEvent::Saved { key, count });
            }
            Err(e) => {
                error!(slot = %key, error = %e, "Failed to persist slot");
                self.emit(PersistenceEvent::SaveFailed { key, error: e.to_string() });
            }
        }
    }

    fn emit(&self, event: PersistenceEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

// =============================================================================
// 5. THE GENERIC CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: Entity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R, T::Error>) -> ResourceRequest<T>,
    ) -> Result<R, T::Error> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::CreateParams) -> Result<T, T::Error> {
        self.request(|respond_to| ResourceRequest::Create { params, respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, T::Error> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to }).await
    }

    pub async fn list(&self) -> Result<Vec<T>, T::Error> {
        self.request(|respond_to| ResourceRequest::List { respond_to }).await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, T::Error> {
        self.request(|respond_to| ResourceRequest::Update { id, patch, respond_to }).await
    }

    pub async fn perform_action(&self, id: T::Id, action: T::Action) -> Result<T::ActionResult, T::Error> {
        self.request(|respond_to| ResourceRequest::Action { id, action, respond_to }).await
    }

    pub async fn clear(&self) -> Result<usize, T::Error> {
        self.request(|respond_to| ResourceRequest::Clear { respond_to }).await
    }

    pub async fn shutdown(&self) -> Result<(), T::Error> {
        self.request(|respond_to| ResourceRequest::Shutdown { respond_to }).await
    }
}

// =============================================================================
// 6. FRAMEWORK TESTS
// =============================================================================
