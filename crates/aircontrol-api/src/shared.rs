// Shared session client
//
// One `SessionClient` behind a tokio mutex. Each operation holds the lock
// for its whole duration, so a clear/login/retry sequence from one task
// never interleaves with another task's request.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::auth::SessionState;
use crate::client::{Form, SessionClient};
use crate::error::Error;
use crate::response::ApiResponse;

/// Cheaply cloneable handle serializing access to one [`SessionClient`].
#[derive(Clone)]
pub struct SharedSessionClient {
    inner: Arc<Mutex<SessionClient>>,
}

impl SharedSessionClient {
    pub fn new(client: SessionClient) -> Self {
        Self {
            inner: Arc::new(Mutex::new(client)),
        }
    }

    pub async fn login(&self) -> Result<(), Error> {
        self.inner.lock().await.login().await
    }

    pub async fn ensure_authenticated(&self) -> Result<(), Error> {
        self.inner.lock().await.ensure_authenticated().await
    }

    pub async fn request(&self, endpoint: &str, form: &Form) -> Result<ApiResponse, Error> {
        self.inner.lock().await.request(endpoint, form).await
    }

    pub async fn list_devices(&self) -> Result<Vec<Value>, Error> {
        self.inner.lock().await.list_devices().await
    }

    pub async fn control_device(&self, control: &Value, operation: &Value) -> Result<(), Error> {
        self.inner
            .lock()
            .await
            .control_device(control, operation)
            .await
    }

    pub async fn test_connection(&self) -> bool {
        self.inner.lock().await.test_connection().await
    }

    /// Snapshot of the current session.
    pub async fn session(&self) -> SessionState {
        self.inner.lock().await.session().clone()
    }
}

impl From<SessionClient> for SharedSessionClient {
    fn from(client: SessionClient) -> Self {
        Self::new(client)
    }
}
