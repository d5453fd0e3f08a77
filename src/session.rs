//! Screen flow of one user session as an explicit state machine.
//!
//! Screens carry their own data, and every move between them is an [`Event`].
//! Submitting an assessment parks the session in [`Screen::Submitting`] until
//! the caller reports how the save went, so storing a result is a visible step
//! and never happens behind navigation.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use crate::assessment::{AssessmentResult, ResponseSet, Role, UserProfile};
use crate::error::Error;
use crate::questions::QUESTION_COUNT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Signed in, profile still loading.
    Loading,
    Auth,
    Profile,
    Home,
    Test {
        current: usize,
        responses: ResponseSet,
    },
    /// Waiting on the caller to store the result.
    Submitting(AssessmentResult),
    Result {
        result: AssessmentResult,
        saved: bool,
        error: Option<String>,
    },
    History,
    AdminDashboard,
    DataVisualization,
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Loading => "loading",
            Screen::Auth => "auth",
            Screen::Profile => "profile",
            Screen::Home => "home",
            Screen::Test { .. } => "test",
            Screen::Submitting(_) => "submitting",
            Screen::Result { .. } => "result",
            Screen::History => "history",
            Screen::AdminDashboard => "admin_dashboard",
            Screen::DataVisualization => "data_visualization",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Authentication finished and the user's profile and history were loaded.
    SignedIn {
        user_id: String,
        profile: Option<UserProfile>,
        history: Vec<AssessmentResult>,
    },
    /// Loading the signed-in user's data failed.
    LoadFailed,
    ProfileSaved(UserProfile),
    StartTest,
    Answer(i8),
    Next,
    Previous,
    Exit,
    SaveSucceeded,
    SaveFailed(String),
    RetrySave,
    Restart,
    ViewHistory,
    ClearHistory,
    OpenVisualization,
    Back,
    SignOut,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::SignedIn { .. } => "signed_in",
            Event::LoadFailed => "load_failed",
            Event::ProfileSaved(_) => "profile_saved",
            Event::StartTest => "start_test",
            Event::Answer(_) => "answer",
            Event::Next => "next",
            Event::Previous => "previous",
            Event::Exit => "exit",
            Event::SaveSucceeded => "save_succeeded",
            Event::SaveFailed(_) => "save_failed",
            Event::RetrySave => "retry_save",
            Event::Restart => "restart",
            Event::ViewHistory => "view_history",
            Event::ClearHistory => "clear_history",
            Event::OpenVisualization => "open_visualization",
            Event::Back => "back",
            Event::SignOut => "sign_out",
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("'{event}' is not allowed on the {screen} screen")]
    InvalidTransition {
        event: &'static str,
        screen: &'static str,
    },
    #[error("question {0} must be answered before moving on")]
    Unanswered(usize),
    #[error(transparent)]
    Assessment(#[from] Error),
}

pub struct Session {
    screen: Screen,
    user_id: Option<String>,
    role: Role,
    history: Vec<AssessmentResult>,
    clock: fn() -> DateTime<Utc>,
}

impl Session {
    /// No signed-in user yet.
    pub fn start() -> Self {
        Self::at(Screen::Auth)
    }

    /// A user is already signed in; their data is being loaded.
    pub fn resume() -> Self {
        Self::at(Screen::Loading)
    }

    fn at(screen: Screen) -> Self {
        Self {
            screen,
            user_id: None,
            role: Role::Student,
            history: Vec::new(),
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Saved results of this user, newest first.
    pub fn history(&self) -> &[AssessmentResult] {
        &self.history
    }

    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }

    fn landing(&self, profile: Option<&UserProfile>) -> Screen {
        match (self.role, profile) {
            (Role::Admin, _) => Screen::AdminDashboard,
            (Role::Student, Some(profile)) if profile.is_complete() => Screen::Home,
            (Role::Student, _) => Screen::Profile,
        }
    }

    fn sign_out(&mut self) {
        self.user_id = None;
        self.role = Role::Student;
        self.history.clear();
        self.screen = Screen::Auth;
    }

    /// Like [`Session::handle`], but a rejected event is logged and reported
    /// as `false` instead of returned.
    pub fn advance(&mut self, event: Event) -> bool {
        let name = event.name();
        match self.handle(event).map(|_| ()) {
            Ok(()) => true,
            Err(err) => {
                warn!(event = name, error = %err, "session rejected event");
                false
            }
        }
    }

    /// Apply one event. On error the session is left unchanged.
    pub fn handle(&mut self, event: Event) -> Result<&Screen, SessionError> {
        let invalid = SessionError::InvalidTransition {
            event: event.name(),
            screen: self.screen.name(),
        };

        match (&mut self.screen, event) {
            (Screen::Auth | Screen::Loading, Event::SignedIn { user_id, profile, mut history }) => {
                self.role = profile.as_ref().map(|p| p.role).unwrap_or_default();
                history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                self.history = if self.role == Role::Admin {
                    Vec::new()
                } else {
                    history
                };
                self.user_id = Some(user_id);
                self.screen = self.landing(profile.as_ref());
            }
            (Screen::Loading, Event::LoadFailed) => self.sign_out(),
            (Screen::Profile, Event::ProfileSaved(profile)) => {
                self.role = profile.role;
                self.screen = self.landing(Some(&profile));
            }
            (Screen::Home, Event::StartTest) => {
                self.screen = Screen::Test {
                    current: 0,
                    responses: ResponseSet::default(),
                };
            }
            (Screen::Test { current, responses }, Event::Answer(value)) => {
                responses.insert(*current, value)?;
            }
            (Screen::Test { current, responses }, Event::Next) => {
                if !responses.is_answered(*current) {
                    return Err(SessionError::Unanswered(*current));
                }
                if *current + 1 < QUESTION_COUNT {
                    *current += 1;
                } else {
                    let user_id = self.user_id.clone().ok_or(Error::EmptyUserId)?;
                    let result = responses.submit(user_id, (self.clock)())?;
                    self.screen = Screen::Submitting(result);
                }
            }
            (Screen::Test { current, .. }, Event::Previous) => {
                *current = current.saturating_sub(1);
            }
            (Screen::Test { .. }, Event::Exit) => self.screen = Screen::Home,
            (Screen::Submitting(result), Event::SaveSucceeded) => {
                let result = result.clone();
                self.history.insert(0, result.clone());
                self.screen = Screen::Result {
                    result,
                    saved: true,
                    error: None,
                };
            }
            (Screen::Submitting(result), Event::SaveFailed(reason)) => {
                self.screen = Screen::Result {
                    result: result.clone(),
                    saved: false,
                    error: Some(reason),
                };
            }
            (Screen::Result { result, saved, .. }, Event::RetrySave) if !*saved => {
                self.screen = Screen::Submitting(result.clone());
            }
            (Screen::Result { .. }, Event::Restart) => self.screen = Screen::Home,
            (Screen::Result { .. } | Screen::Home, Event::ViewHistory) => {
                self.screen = Screen::History
            }
            (Screen::History, Event::ClearHistory) => self.history.clear(),
            (Screen::History, Event::Back) => self.screen = Screen::Home,
            (Screen::AdminDashboard, Event::OpenVisualization) => {
                self.screen = Screen::DataVisualization
            }
            (Screen::DataVisualization, Event::Back) => self.screen = Screen::AdminDashboard,
            (Screen::Auth, Event::SignOut) => return Err(invalid),
            (_, Event::SignOut) => self.sign_out(),
            _ => return Err(invalid),
        }

        Ok(&self.screen)
    }
}
