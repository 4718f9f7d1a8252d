use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Local;

use crate::{
    backend::{self, fixtures},
    cli::{Cli, Command},
    domain::{
        self,
        chat::{ChatSummary, ChatType},
        conversation::ConversationId,
        events::PresenceEvent,
        message::{Message, MessageDraft},
        notification::Notification,
        user::{User, UserId},
    },
    infra,
    usecases::{
        self, bootstrap,
        context::AppContext,
        guided_auth::{
            run_guided_login, run_guided_register, GuidedAuthOutcome, RetryPolicy, StdTerminal,
        },
        list_chats::ListChatsQuery,
        logout::logout_and_reset,
        session::SocialProvider,
    },
};

const DEMO_GREETING: &str = "Hey Alex! Just watched it again 🍿";
const PUMP_INTERVAL: Duration = Duration::from_millis(250);
const DEMO_SEND_FAILED: &str = "DEMO_SEND_FAILED";

pub fn run(cli: Cli) -> Result<()> {
    tracing::debug!(
        domain = domain::module_name(),
        usecases = usecases::module_name(),
        backend = backend::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );

    let context = bootstrap::bootstrap(cli.config.as_deref())?;

    match cli.command_or_default() {
        Command::Demo { say, seconds } => run_demo(&context, say, seconds)?,
        Command::Login { email, provider } => run_login(&context, email, provider)?,
        Command::Register { username, email } => {
            let outcome = run_guided_register(
                &mut StdTerminal,
                &context.session,
                username,
                email,
                &RetryPolicy::default(),
            )?;
            report_auth_outcome(&outcome);
        }
        Command::Logout => {
            let outcome = logout_and_reset(&context);
            if outcome.token_removed {
                println!("Signed out. See you soon 👋");
            } else {
                println!("No saved session. Nothing to sign out from.");
            }
        }
        Command::Status => match context.session.restore()? {
            Some(user) => {
                println!("Signed in as {} {}", user.avatar, user.display_label());
                println!("Status: {}", user.status);
            }
            None => println!("{}", signed_out_guidance()),
        },
        Command::Chats { query } => run_chats(&context, query)?,
    }

    Ok(())
}

fn run_login(
    context: &AppContext,
    email: Option<String>,
    provider: Option<SocialProvider>,
) -> Result<()> {
    if let Some(provider) = provider {
        let user = context.session.social_login(provider)?;
        println!("Signed in as {} {}", user.avatar, user.display_label());
        return Ok(());
    }

    let outcome = run_guided_login(
        &mut StdTerminal,
        &context.session,
        email,
        &RetryPolicy::default(),
    )?;
    report_auth_outcome(&outcome);
    Ok(())
}

fn report_auth_outcome(outcome: &GuidedAuthOutcome) {
    if matches!(outcome, GuidedAuthOutcome::ExitWithGuidance) {
        println!("Not signed in. Run vibechat login or vibechat register to try again.");
    }
}

/// Restores the stored session or falls back to an interactive sign-in.
fn resume_or_sign_in(context: &AppContext) -> Result<Option<User>> {
    if let Some(user) = context.session.restore()? {
        return Ok(Some(user));
    }

    let outcome = run_guided_login(
        &mut StdTerminal,
        &context.session,
        None,
        &RetryPolicy::default(),
    )?;
    match outcome {
        GuidedAuthOutcome::Authenticated(user) => Ok(Some(user)),
        GuidedAuthOutcome::ExitWithGuidance => Ok(None),
    }
}

fn run_chats(context: &AppContext, query: Option<String>) -> Result<()> {
    if context.session.restore()?.is_none() {
        println!("{}", signed_out_guidance());
        return Ok(());
    }
    context.pump.connect();

    let output = context.list_chats(ListChatsQuery {
        search: query,
        ..ListChatsQuery::default()
    })?;

    if output.chats.is_empty() {
        println!("No chats match.");
    }
    for chat in &output.chats {
        println!("{}", chat_line(chat));
    }
    context.pump.disconnect();
    Ok(())
}

fn run_demo(context: &AppContext, say: Vec<String>, seconds: u64) -> Result<()> {
    let Some(user) = resume_or_sign_in(context)? else {
        println!("{}", signed_out_guidance());
        return Ok(());
    };
    println!("{} {} · {}", user.avatar, user.username, user.status);

    context.feed.request_permission();

    let conversation = ConversationId::new(fixtures::TYPING_CONVERSATION);
    let messages = context.channel.subscribe(&conversation);
    let presence = context.presence.subscribe();
    let notifications = context.feed.subscribe();
    context.pump.connect();

    let outgoing = if say.is_empty() {
        vec![DEMO_GREETING.to_owned()]
    } else {
        say
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async {
        context.pump.pump();
        render_pending(&messages, &presence, &notifications);

        for text in outgoing {
            if let Err(error) = context.channel.send(&conversation, MessageDraft::text(text)) {
                tracing::warn!(code = DEMO_SEND_FAILED, reason = error.code(), "demo send failed");
                println!("Could not send: {error}");
            }
        }

        let deadline = Instant::now() + Duration::from_secs(seconds);
        let mut ticker = tokio::time::interval(PUMP_INTERVAL);
        while Instant::now() < deadline {
            ticker.tick().await;
            context.pump.pump();
            render_pending(&messages, &presence, &notifications);
        }
    });

    context.pump.disconnect();
    println!(
        "🔔 {} unread notification(s) · {} online",
        context.feed.unread_count(),
        context.presence.online_users().len()
    );
    Ok(())
}

fn render_pending(
    messages: &usecases::message_channel::Subscription,
    presence: &std::sync::mpsc::Receiver<PresenceEvent>,
    notifications: &std::sync::mpsc::Receiver<Notification>,
) {
    for message in messages.drain() {
        println!("{}", message_line(&message));
    }
    for event in presence.try_iter() {
        if let Some(line) = presence_line(&event) {
            println!("{line}");
        }
    }
    for notification in notifications.try_iter() {
        if !notification.is_read() {
            println!("🔔 {}: {}", notification.title(), notification.body());
        }
    }
}

fn signed_out_guidance() -> &'static str {
    "Not signed in. Run vibechat login to start a session."
}

fn sender_label(message: &Message) -> String {
    if message.is_outgoing() {
        return "You".to_owned();
    }
    display_name(message.sender_id())
}

fn display_name(user_id: &UserId) -> String {
    fixtures::peer_name(user_id).unwrap_or_else(|| user_id.to_string())
}

fn message_line(message: &Message) -> String {
    format!(
        "[{}] {}: {}",
        message.timestamp().with_timezone(&Local).format("%H:%M"),
        sender_label(message),
        message.display_content()
    )
}

fn presence_line(event: &PresenceEvent) -> Option<String> {
    match event {
        PresenceEvent::TypingStarted { user_id, .. } => {
            Some(format!("{} is typing...", display_name(user_id)))
        }
        PresenceEvent::Online { user_id } => Some(format!("● {} is online", display_name(user_id))),
        PresenceEvent::Offline { user_id } => {
            Some(format!("○ {} went offline", display_name(user_id)))
        }
        PresenceEvent::TypingStopped { .. } => None,
    }
}

fn chat_line(chat: &ChatSummary) -> String {
    let mut line = format!("{} {}", chat.avatar, chat.title);
    if let ChatType::Group { members } = chat.chat_type {
        line.push_str(&format!(" ({members})"));
    }
    if chat.is_online {
        line.push_str(" ●");
    }
    if chat.unread_count > 0 {
        line.push_str(&format!(" [{}]", chat.unread_count));
    }
    if let Some(preview) = chat.preview_line() {
        line.push_str(&format!("\n    {preview}"));
    }
    line
}
