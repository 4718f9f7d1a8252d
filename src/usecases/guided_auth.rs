use std::io;

use crate::{
    domain::user::User,
    usecases::session::{AuthError, Credentials, RegistrationProfile, SessionStore},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub field_attempts: usize,
    pub submit_attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            field_attempts: 3,
            submit_attempts: 3,
        }
    }
}

pub trait AuthTerminal {
    fn print_line(&mut self, line: &str) -> io::Result<()>;
    fn prompt_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
    fn prompt_secret(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

pub struct StdTerminal;

impl AuthTerminal for StdTerminal {
    fn print_line(&mut self, line: &str) -> io::Result<()> {
        println!("{line}");
        Ok(())
    }

    fn prompt_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        use std::io::Write;

        print!("{prompt}");
        io::stdout().flush()?;

        let mut line = String::new();
        let bytes = io::stdin().read_line(&mut line)?;
        if bytes == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim().to_owned()))
    }

    fn prompt_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match rpassword::prompt_password(prompt) {
            Ok(password) => Ok(Some(password)),
            Err(source) if source.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(source) => Err(source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuidedAuthOutcome {
    Authenticated(User),
    ExitWithGuidance,
}

/// Interactive sign-in. A known `email` skips its prompt.
pub fn run_guided_login(
    terminal: &mut dyn AuthTerminal,
    session: &SessionStore,
    email: Option<String>,
    retry_policy: &RetryPolicy,
) -> io::Result<GuidedAuthOutcome> {
    terminal.print_line("Welcome back! Sign in to continue the vibe ✨")?;

    let Some(email) = collect_email(terminal, email, "Step 1/2", retry_policy.field_attempts)?
    else {
        return Ok(GuidedAuthOutcome::ExitWithGuidance);
    };

    for attempt in 1..=retry_policy.submit_attempts {
        let Some(password) =
            collect_password(terminal, "Step 2/2", retry_policy.field_attempts)?
        else {
            return Ok(GuidedAuthOutcome::ExitWithGuidance);
        };

        match session.login(&Credentials::new(email.clone(), password)) {
            Ok(user) => return finish(terminal, user),
            Err(error) => {
                if !handle_auth_error(terminal, &error, attempt, retry_policy.submit_attempts)? {
                    return Ok(GuidedAuthOutcome::ExitWithGuidance);
                }
            }
        }
    }

    terminal.print_line("Sign-in failed too many times. Run vibechat login again later.")?;
    Ok(GuidedAuthOutcome::ExitWithGuidance)
}

/// Interactive account creation. Known fields skip their prompts.
pub fn run_guided_register(
    terminal: &mut dyn AuthTerminal,
    session: &SessionStore,
    username: Option<String>,
    email: Option<String>,
    retry_policy: &RetryPolicy,
) -> io::Result<GuidedAuthOutcome> {
    terminal.print_line("Join VibeChat 🎉")?;

    let Some(username) = collect_username(terminal, username, retry_policy.field_attempts)? else {
        return Ok(GuidedAuthOutcome::ExitWithGuidance);
    };
    let Some(email) = collect_email(terminal, email, "Step 2/3", retry_policy.field_attempts)?
    else {
        return Ok(GuidedAuthOutcome::ExitWithGuidance);
    };

    for attempt in 1..=retry_policy.submit_attempts {
        let Some(password) =
            collect_password(terminal, "Step 3/3", retry_policy.field_attempts)?
        else {
            return Ok(GuidedAuthOutcome::ExitWithGuidance);
        };

        let profile = RegistrationProfile {
            username: username.clone(),
            email: email.clone(),
            password,
        };
        match session.register(&profile) {
            Ok(user) => return finish(terminal, user),
            Err(error) => {
                if !handle_auth_error(terminal, &error, attempt, retry_policy.submit_attempts)? {
                    return Ok(GuidedAuthOutcome::ExitWithGuidance);
                }
            }
        }
    }

    terminal.print_line("Registration failed too many times. Run vibechat register again later.")?;
    Ok(GuidedAuthOutcome::ExitWithGuidance)
}

fn finish(terminal: &mut dyn AuthTerminal, user: User) -> io::Result<GuidedAuthOutcome> {
    terminal.print_line(&format!(
        "Signed in as {} {}. Session saved.",
        user.avatar, user.username
    ))?;
    Ok(GuidedAuthOutcome::Authenticated(user))
}

fn collect_username(
    terminal: &mut dyn AuthTerminal,
    known: Option<String>,
    attempts: usize,
) -> io::Result<Option<String>> {
    if let Some(username) = known.filter(|value| !value.trim().is_empty()) {
        return Ok(Some(username.trim().to_owned()));
    }

    for attempt in 1..=attempts {
        terminal.print_line("Step 1/3: Pick a display name.")?;
        let Some(username) = terminal.prompt_line("Username: ")? else {
            terminal.print_line("Input cancelled (EOF). Run vibechat again to retry.")?;
            return Ok(None);
        };

        if username.trim().is_empty() {
            terminal.print_line(&format!(
                "Username cannot be empty. Attempts left: {}",
                attempts.saturating_sub(attempt)
            ))?;
            continue;
        }

        return Ok(Some(username.trim().to_owned()));
    }

    terminal.print_line("Username step failed too many times.")?;
    Ok(None)
}

fn collect_email(
    terminal: &mut dyn AuthTerminal,
    known: Option<String>,
    step: &str,
    attempts: usize,
) -> io::Result<Option<String>> {
    if let Some(email) = known {
        if is_valid_email(&email) {
            return Ok(Some(email.trim().to_owned()));
        }
        terminal.print_line("The email passed on the command line looks invalid.")?;
    }

    for attempt in 1..=attempts {
        terminal.print_line(&format!("{step}: Enter your email, e.g. alex@example.com."))?;
        let Some(email) = terminal.prompt_line("Email: ")? else {
            terminal.print_line("Input cancelled (EOF). Run vibechat again to retry.")?;
            return Ok(None);
        };

        if !is_valid_email(&email) {
            terminal.print_line(&format!(
                "That doesn't look like an email address. Attempts left: {}",
                attempts.saturating_sub(attempt)
            ))?;
            continue;
        }

        return Ok(Some(email.trim().to_owned()));
    }

    terminal.print_line("Email step failed too many times.")?;
    Ok(None)
}

fn collect_password(
    terminal: &mut dyn AuthTerminal,
    step: &str,
    attempts: usize,
) -> io::Result<Option<String>> {
    for attempt in 1..=attempts {
        terminal.print_line(&format!("{step}: Enter your password."))?;
        let Some(password) = terminal.prompt_secret("Password: ")? else {
            terminal.print_line("Input cancelled (EOF). Run vibechat again to retry.")?;
            return Ok(None);
        };

        if password.is_empty() {
            terminal.print_line(&format!(
                "Password cannot be empty. Attempts left: {}",
                attempts.saturating_sub(attempt)
            ))?;
            continue;
        }

        return Ok(Some(password));
    }

    terminal.print_line("Password step failed too many times.")?;
    Ok(None)
}

/// Prints the error and returns whether another attempt makes sense.
fn handle_auth_error(
    terminal: &mut dyn AuthTerminal,
    error: &AuthError,
    attempt: usize,
    max_attempts: usize,
) -> io::Result<bool> {
    let attempts_left = max_attempts.saturating_sub(attempt);

    match error {
        AuthError::TokenStorage(_) => {
            terminal.print_line(&format!("{}: {}", error.code(), error.user_message()))?;
            Ok(false)
        }
        AuthError::InvalidCredentials
        | AuthError::NetworkUnavailable
        | AuthError::SessionExpired => {
            terminal.print_line(&format!(
                "{}: {} Attempts left: {attempts_left}",
                error.code(),
                error.user_message()
            ))?;
            Ok(attempts_left > 0)
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    use super::*;
    use crate::{
        backend::{fixtures, MockBackend},
        infra::{clock::ManualClock, config::MockConfig, stubs::MemoryTokenStore},
        usecases::{
            contracts::AuthBackend,
            session::{AuthGrant, SessionToken, SocialProvider},
        },
    };

    struct FakeTerminal {
        inputs: VecDeque<Option<String>>,
        output: Vec<String>,
    }

    impl FakeTerminal {
        fn new(inputs: Vec<Option<&str>>) -> Self {
            Self {
                inputs: inputs
                    .into_iter()
                    .map(|item| item.map(|value| value.to_owned()))
                    .collect(),
                output: Vec::new(),
            }
        }

        fn saw(&self, needle: &str) -> bool {
            self.output.iter().any(|line| line.contains(needle))
        }
    }

    impl AuthTerminal for FakeTerminal {
        fn print_line(&mut self, line: &str) -> io::Result<()> {
            self.output.push(line.to_owned());
            Ok(())
        }

        fn prompt_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
            Ok(self.inputs.pop_front().flatten())
        }

        fn prompt_secret(&mut self, _prompt: &str) -> io::Result<Option<String>> {
            Ok(self.inputs.pop_front().flatten())
        }
    }

    /// Fails sign-in with the queued errors, then succeeds.
    #[derive(Debug)]
    struct FlakyBackend {
        failures: Mutex<VecDeque<AuthError>>,
    }

    impl FlakyBackend {
        fn new(failures: Vec<AuthError>) -> Self {
            Self {
                failures: Mutex::new(failures.into()),
            }
        }

        fn next(&self, email: &str) -> Result<AuthGrant, AuthError> {
            if let Some(error) = self.failures.lock().expect("failures lock").pop_front() {
                return Err(error);
            }
            Ok(AuthGrant {
                user: fixtures::default_local_user(email),
                token: SessionToken::new("flaky"),
            })
        }
    }

    impl AuthBackend for FlakyBackend {
        fn sign_in(&self, credentials: &Credentials) -> Result<AuthGrant, AuthError> {
            self.next(&credentials.email)
        }

        fn sign_up(&self, profile: &RegistrationProfile) -> Result<AuthGrant, AuthError> {
            self.next(&profile.email)
        }

        fn sign_in_with_provider(&self, _provider: SocialProvider) -> Result<AuthGrant, AuthError> {
            self.next("user@example.com")
        }

        fn resume(&self, _token: &SessionToken) -> Result<User, AuthError> {
            Err(AuthError::SessionExpired)
        }
    }

    fn mock_session() -> SessionStore {
        let backend = MockBackend::new(Arc::new(ManualClock::default()), MockConfig::default());
        SessionStore::new(
            Arc::new(backend),
            Arc::new(MemoryTokenStore::default()),
            "vibechat_token",
        )
    }

    fn flaky_session(failures: Vec<AuthError>) -> SessionStore {
        SessionStore::new(
            Arc::new(FlakyBackend::new(failures)),
            Arc::new(MemoryTokenStore::default()),
            "vibechat_token",
        )
    }

    #[test]
    fn login_happy_path_prompts_for_email_and_password() {
        let session = mock_session();
        let mut terminal = FakeTerminal::new(vec![Some("alex@example.com"), Some("secret")]);

        let outcome = run_guided_login(&mut terminal, &session, None, &RetryPolicy::default())
            .expect("guided login should complete");

        let GuidedAuthOutcome::Authenticated(user) = outcome else {
            panic!("expected authentication, got {outcome:?}");
        };
        assert_eq!(user.email, "alex@example.com");
        assert!(session.is_authenticated());
        assert!(terminal.saw("Session saved"));
    }

    #[test]
    fn login_with_known_email_only_asks_for_password() {
        let session = mock_session();
        let mut terminal = FakeTerminal::new(vec![Some("secret")]);

        let outcome = run_guided_login(
            &mut terminal,
            &session,
            Some("maya@example.com".to_owned()),
            &RetryPolicy::default(),
        )
        .expect("guided login should complete");

        assert!(matches!(outcome, GuidedAuthOutcome::Authenticated(_)));
        assert!(!terminal.saw("Enter your email"));
    }

    #[test]
    fn invalid_email_retries_then_succeeds() {
        let session = mock_session();
        let mut terminal = FakeTerminal::new(vec![
            Some("not-an-email"),
            Some("alex@example.com"),
            Some("secret"),
        ]);

        let outcome = run_guided_login(&mut terminal, &session, None, &RetryPolicy::default())
            .expect("guided login should complete");

        assert!(matches!(outcome, GuidedAuthOutcome::Authenticated(_)));
        assert!(terminal.saw("Attempts left: 2"));
    }

    #[test]
    fn network_failure_retries_then_succeeds() {
        let session = flaky_session(vec![AuthError::NetworkUnavailable]);
        let mut terminal = FakeTerminal::new(vec![Some("first"), Some("second")]);

        let outcome = run_guided_login(
            &mut terminal,
            &session,
            Some("alex@example.com".to_owned()),
            &RetryPolicy::default(),
        )
        .expect("guided login should complete");

        assert!(matches!(outcome, GuidedAuthOutcome::Authenticated(_)));
        assert!(terminal.saw("AUTH_NETWORK_UNAVAILABLE"));
    }

    #[test]
    fn token_storage_failure_exits_immediately() {
        let session = flaky_session(vec![AuthError::TokenStorage("disk full".to_owned())]);
        let mut terminal = FakeTerminal::new(vec![Some("secret")]);

        let outcome = run_guided_login(
            &mut terminal,
            &session,
            Some("alex@example.com".to_owned()),
            &RetryPolicy::default(),
        )
        .expect("guided login should complete");

        assert_eq!(outcome, GuidedAuthOutcome::ExitWithGuidance);
        assert!(terminal.saw("AUTH_TOKEN_STORAGE"));
        assert!(!terminal.saw("disk full"));
    }

    #[test]
    fn repeated_rejections_exhaust_retries() {
        let session = flaky_session(vec![
            AuthError::InvalidCredentials,
            AuthError::InvalidCredentials,
            AuthError::InvalidCredentials,
        ]);
        let mut terminal = FakeTerminal::new(vec![Some("a"), Some("b"), Some("c")]);

        let outcome = run_guided_login(
            &mut terminal,
            &session,
            Some("alex@example.com".to_owned()),
            &RetryPolicy::default(),
        )
        .expect("guided login should complete");

        assert_eq!(outcome, GuidedAuthOutcome::ExitWithGuidance);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn eof_cancels_flow_cleanly() {
        let session = mock_session();
        let mut terminal = FakeTerminal::new(vec![None]);

        let outcome = run_guided_login(&mut terminal, &session, None, &RetryPolicy::default())
            .expect("guided login should complete");

        assert_eq!(outcome, GuidedAuthOutcome::ExitWithGuidance);
        assert!(terminal.saw("Input cancelled"));
    }

    #[test]
    fn register_collects_missing_fields() {
        let session = mock_session();
        let mut terminal = FakeTerminal::new(vec![Some(""), Some("Jamie"), Some("pw")]);

        let outcome = run_guided_register(
            &mut terminal,
            &session,
            None,
            Some("jamie@example.com".to_owned()),
            &RetryPolicy::default(),
        )
        .expect("guided register should complete");

        let GuidedAuthOutcome::Authenticated(user) = outcome else {
            panic!("expected authentication, got {outcome:?}");
        };
        assert_eq!(user.username, "Jamie");
        assert_eq!(user.avatar, "🚀");
        assert!(terminal.saw("Username cannot be empty"));
    }

    #[test]
    fn password_never_reaches_terminal_output() {
        let session = mock_session();
        let mut terminal = FakeTerminal::new(vec![Some("alex@example.com"), Some("hunter2")]);

        run_guided_login(&mut terminal, &session, None, &RetryPolicy::default())
            .expect("guided login should complete");

        assert!(!terminal.output.join("\n").contains("hunter2"));
    }

    #[test]
    fn email_validation_needs_both_parts() {
        assert!(is_valid_email("alex@example.com"));
        assert!(is_valid_email("  alex@example.com "));
        assert!(!is_valid_email("alex@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alex example.com"));
        assert!(!is_valid_email("a@b@c"));
    }
}
