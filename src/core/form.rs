use crate::core::events::{Field, FormEvent};
use crate::core::model::{AudioFormat, BackendReply, DownloadRequest, FormOption, Resolution, VideoFormat};
use crate::core::status::{DownloadStatus, StatusTone};
use crate::i18n::Messages;
use crate::plugins::registry::{BackendError, DownloadBackend};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    Busy,
    #[error("url is required")]
    MissingUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Url(String),
    Resolution(Resolution),
    Format(VideoFormat),
    AudioOnly(bool),
    AudioFormat(AudioFormat),
}

impl FieldUpdate {
    pub fn field(&self) -> Field {
        match self {
            Self::Url(_) => Field::Url,
            Self::Resolution(_) => Field::Resolution,
            Self::Format(_) => Field::Format,
            Self::AudioOnly(_) => Field::AudioOnly,
            Self::AudioFormat(_) => Field::AudioFormat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Url { label: &'static str, placeholder: &'static str, value: String, required: bool },
    AudioOnly { label: &'static str, checked: bool },
    Select { field: Field, label: &'static str, selected: &'static str, options: Vec<SelectOption> },
}

impl Control {
    pub fn field(&self) -> Field {
        match self {
            Self::Url { .. } => Field::Url,
            Self::AudioOnly { .. } => Field::AudioOnly,
            Self::Select { field, .. } => *field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub text: String,
    pub tone: StatusTone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub title: &'static str,
    pub controls: Vec<Control>,
    pub submit_label: &'static str,
    pub submit_enabled: bool,
    pub status: Option<StatusView>,
}

fn select<T: FormOption>(field: Field, label: &'static str, current: T) -> Control {
    Control::Select {
        field,
        label,
        selected: current.as_str(),
        options: T::ALL
            .iter()
            .map(|o| SelectOption { value: o.as_str(), label: o.label() })
            .collect(),
    }
}

/// Releases the in-flight slot on every exit path, including a dropped future.
struct InFlight<'a> {
    ctl: &'a FormController,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.ctl.busy.store(false, Ordering::Release);
        let _ = self.ctl.event_tx.send(FormEvent::BusyChanged { busy: false });
    }
}

/// Owns the form fields, the busy marker and the latest status. Clones share
/// the same state.
#[derive(Clone)]
pub struct FormController {
    backend: Arc<dyn DownloadBackend>,
    msgs: &'static Messages,
    request: Arc<Mutex<DownloadRequest>>,
    status: Arc<Mutex<DownloadStatus>>,
    last_output: Arc<Mutex<Option<String>>>,
    busy: Arc<AtomicBool>,
    event_tx: broadcast::Sender<FormEvent>,
}

impl FormController {
    pub fn new(backend: Arc<dyn DownloadBackend>, msgs: &'static Messages) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            backend,
            msgs,
            request: Arc::new(Mutex::new(DownloadRequest::default())),
            status: Arc::new(Mutex::new(DownloadStatus::Idle)),
            last_output: Arc::new(Mutex::new(None)),
            busy: Arc::new(AtomicBool::new(false)),
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FormEvent> {
        self.event_tx.subscribe()
    }

    pub fn request(&self) -> DownloadRequest {
        self.request.lock().clone()
    }

    pub fn status(&self) -> DownloadStatus {
        self.status.lock().clone()
    }

    /// Service output attached to the latest successful submission, if any.
    pub fn last_output(&self) -> Option<String> {
        self.last_output.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Replaces one field. Other fields are never touched, so switching
    /// audio-only keeps the hidden selections for later.
    pub fn apply(&self, update: FieldUpdate) {
        let field = update.field();
        {
            let mut req = self.request.lock();
            match update {
                FieldUpdate::Url(v) => req.url = v,
                FieldUpdate::Resolution(v) => req.resolution = v,
                FieldUpdate::Format(v) => req.format = v,
                FieldUpdate::AudioOnly(v) => req.audio_only = v,
                FieldUpdate::AudioFormat(v) => req.audio_format = v,
            }
        }
        let _ = self.event_tx.send(FormEvent::FieldChanged { field });
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.apply(FieldUpdate::Url(url.into()));
    }

    pub fn set_resolution(&self, v: Resolution) {
        self.apply(FieldUpdate::Resolution(v));
    }

    pub fn set_format(&self, v: VideoFormat) {
        self.apply(FieldUpdate::Format(v));
    }

    pub fn set_audio_only(&self, v: bool) {
        self.apply(FieldUpdate::AudioOnly(v));
    }

    pub fn set_audio_format(&self, v: AudioFormat) {
        self.apply(FieldUpdate::AudioFormat(v));
    }

    pub fn render(&self) -> FormView {
        let req = self.request();
        let m = self.msgs;

        let mut controls = vec![
            Control::Url {
                label: m.url_label,
                placeholder: m.url_placeholder,
                value: req.url.clone(),
                required: true,
            },
            Control::AudioOnly { label: m.audio_only_label, checked: req.audio_only },
        ];
        if req.audio_only {
            controls.push(select(Field::AudioFormat, m.audio_format_label, req.audio_format));
        } else {
            controls.push(select(Field::Resolution, m.resolution_label, req.resolution));
            controls.push(select(Field::Format, m.format_label, req.format));
        }

        let busy = self.is_busy();
        let status = self.status();
        FormView {
            title: m.title,
            controls,
            submit_label: if busy { m.submit_busy } else { m.submit_idle },
            submit_enabled: !busy,
            status: status
                .text(m)
                .zip(status.tone())
                .map(|(text, tone)| StatusView { text, tone }),
        }
    }

    fn set_status(&self, status: DownloadStatus) {
        *self.status.lock() = status.clone();
        let _ = self.event_tx.send(FormEvent::StatusChanged { status });
    }

    /// Sends the current fields to the backend and records the outcome.
    ///
    /// At most one submission runs at a time: a second call while one is in
    /// flight returns [`SubmitError::Busy`] without touching any state or the
    /// network.
    pub async fn submit(&self) -> Result<DownloadStatus, SubmitError> {
        let request = self.request();
        if request.url.is_empty() {
            return Err(SubmitError::MissingUrl);
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("submit rejected: already in flight");
            return Err(SubmitError::Busy);
        }
        let _guard = InFlight { ctl: self };
        let _ = self.event_tx.send(FormEvent::BusyChanged { busy: true });

        let submission_id = Uuid::new_v4();
        info!(%submission_id, backend = self.backend.name(), url = %request.url, audio_only = request.audio_only, "submitting download");
        debug!(%submission_id, ?request, "payload");
        *self.last_output.lock() = None;
        self.set_status(DownloadStatus::InProgress);
        let _ = self.event_tx.send(FormEvent::Submitted { submission_id, request: request.clone() });

        let outcome = self.backend.submit(&request).await;
        let status = self.settle(outcome);
        match &status {
            DownloadStatus::Failure(msg) => warn!(%submission_id, error = %msg, "download failed"),
            _ => info!(%submission_id, "download completed"),
        }
        self.set_status(status.clone());
        Ok(status)
    }

    fn settle(&self, outcome: Result<BackendReply, BackendError>) -> DownloadStatus {
        match outcome {
            Ok(reply) if reply.transport_ok() && reply.body.success => {
                if let Some(msg) = reply.body.message.as_deref() {
                    debug!(message = msg, "backend message");
                }
                *self.last_output.lock() = reply.body.output;
                DownloadStatus::Success
            }
            Ok(reply) => {
                let msg = reply
                    .body
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| self.msgs.default_failure.to_string());
                DownloadStatus::Failure(msg)
            }
            Err(e) => DownloadStatus::Failure(e.to_string()),
        }
    }
}
