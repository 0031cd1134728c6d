#![cfg(test)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use mockall::{Sequence, mock};
use tokio::sync::Notify;
use thunder_byte::{
    base::{
        prompts,
        types::{FALLBACK_RESPONSE, HistoryRecord, MESSAGE_LIMIT, Res, UserId, Void},
    },
    interaction::{
        chat_event::{self, ChatState, CommandReplier, Invoker},
        chunk::{self, MessageSink},
        cooldown::Cooldowns,
        response::ResponseGenerator,
    },
    service::{
        db::{DbClient, GenericDbClient},
        llm::{GenericLlmClient, LlmClient},
    },
};

// Mocks.

mock! {
    pub Llm {}

    #[async_trait]
    impl GenericLlmClient for Llm {
        async fn generate_content(&self, prompt: &str) -> Res<String>;
    }
}

mock! {
    pub Db {}

    #[async_trait]
    impl GenericDbClient for Db {
        async fn get_history(&self, user_id: UserId) -> Res<Vec<HistoryRecord>>;
        async fn set_history(&self, user_id: UserId, history: &[HistoryRecord]) -> Void;
        async fn delete_history(&self, user_id: UserId) -> Void;
    }
}

mock! {
    pub Sink {}

    #[async_trait]
    impl MessageSink for Sink {
        async fn send(&self, text: &str) -> Void;
    }
}

mock! {
    pub Replier {}

    #[async_trait]
    impl CommandReplier for Replier {
        async fn reply(&self, text: &str, private: bool) -> Void;
        async fn defer(&self) -> Void;
        async fn follow_up(&self, text: &str, private: bool) -> Void;
    }
}

/// An LLM that holds prompts containing "slow" until released.
struct GatedLlm {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl GenericLlmClient for GatedLlm {
    async fn generate_content(&self, prompt: &str) -> Res<String> {
        if prompt.contains("slow") {
            self.started.notify_one();
            self.release.notified().await;
            return Ok("slow reply".to_string());
        }

        Ok("fast reply".to_string())
    }
}

// Helpers.

type Recorded = Arc<Mutex<Vec<String>>>;

/// An LLM that records every prompt and answers with `reply`.
fn recording_llm(reply: &'static str) -> (MockLlm, Recorded) {
    let seen: Recorded = Arc::new(Mutex::new(Vec::new()));
    let captured = seen.clone();

    let mut llm = MockLlm::new();
    llm.expect_generate_content().returning(move |prompt| {
        captured.lock().unwrap().push(prompt.to_string());
        Ok(reply.to_string())
    });

    (llm, seen)
}

fn failing_llm() -> MockLlm {
    let mut llm = MockLlm::new();
    llm.expect_generate_content().returning(|_| Err(anyhow::anyhow!("model unavailable")));
    llm
}

fn generator(db: DbClient, llm: MockLlm) -> ResponseGenerator {
    ResponseGenerator::new(db, LlmClient::new(Arc::new(llm)), 10)
}

fn chat_state(generator: ResponseGenerator) -> ChatState {
    ChatState {
        generator,
        cooldowns: Arc::new(Cooldowns::new(Duration::from_secs(5))),
        denylist: Arc::new(vec!["vulgarity".to_string(), "inappropriate".to_string()]),
    }
}

fn invoker(user_id: u64) -> Invoker {
    Invoker {
        user_id,
        guild_id: Some(1),
        display_name: "Ada".to_string(),
    }
}

fn options(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// A sink that records everything it is sent.
fn recording_sink() -> (MockSink, Recorded) {
    let sent: Recorded = Arc::new(Mutex::new(Vec::new()));
    let captured = sent.clone();

    let mut sink = MockSink::new();
    sink.expect_send().returning(move |text| {
        captured.lock().unwrap().push(text.to_string());
        Ok(())
    });

    (sink, sent)
}

// Response generation.

#[tokio::test]
async fn test_first_exchange_is_stored() {
    let db = DbClient::memory();
    let (llm, seen) = recording_llm("Gravity is a force.");
    let generator = generator(db.clone(), llm);
    let user = UserId(100);

    let reply = generator.generate("Answer this science question: What is gravity?", "Ada", user).await;

    assert_eq!(reply, "Gravity is a force.");

    let sent = seen.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].contains("Human:"));
    assert!(!sent[0].contains("Assistant:"));
    assert!(sent[0].starts_with(prompts::HISTORY_PREAMBLE));
    assert!(sent[0].ends_with("Answer this science question: What is gravity?"));

    assert_eq!(
        db.get_history(user).await.unwrap(),
        vec![HistoryRecord::human("Answer this science question: What is gravity?"), HistoryRecord::assistant("Gravity is a force.")]
    );
}

#[tokio::test]
async fn test_sixth_exchange_evicts_oldest() {
    let db = DbClient::memory();
    let (llm, seen) = recording_llm("ok");
    let generator = generator(db.clone(), llm);
    let user = UserId(200);

    for i in 0..6 {
        generator.generate(&format!("question {i}"), "Ada", user).await;
    }

    let history = db.get_history(user).await.unwrap();

    assert_eq!(history.len(), 10);
    assert_eq!(history[0], HistoryRecord::human("question 1"));
    assert_eq!(history[8], HistoryRecord::human("question 5"));
    assert_eq!(history[9], HistoryRecord::assistant("ok"));

    // The last prompt carried the five earlier exchanges in order.
    let last = seen.lock().unwrap().last().cloned().unwrap();
    let first = last.find("Human: question 0\n").unwrap();
    let fifth = last.find("Human: question 4\n").unwrap();
    assert!(first < fifth);
}

#[tokio::test]
async fn test_generation_fault_returns_fallback_and_keeps_history() {
    let db = DbClient::memory();
    let user = UserId(300);
    let existing = vec![HistoryRecord::human("hi"), HistoryRecord::assistant("hello")];
    db.set_history(user, &existing).await.unwrap();

    let generator = generator(db.clone(), failing_llm());

    let reply = generator.generate("anything", "Ada", user).await;

    assert_eq!(reply, FALLBACK_RESPONSE);
    assert_eq!(db.get_history(user).await.unwrap(), existing);
}

#[tokio::test]
async fn test_read_fault_returns_fallback_without_generation() {
    let mut db = MockDb::new();
    db.expect_get_history().returning(|_| Err(anyhow::anyhow!("connection reset")));
    db.expect_set_history().never();

    let mut llm = MockLlm::new();
    llm.expect_generate_content().never();

    let generator = ResponseGenerator::new(DbClient::new(Arc::new(db)), LlmClient::new(Arc::new(llm)), 10);

    assert_eq!(generator.generate("anything", "Ada", UserId(1)).await, FALLBACK_RESPONSE);
}

#[tokio::test]
async fn test_write_fault_still_returns_reply() {
    let mut db = MockDb::new();
    db.expect_get_history().returning(|_| Ok(Vec::new()));
    db.expect_set_history().times(1).returning(|_, _| Err(anyhow::anyhow!("disk full")));

    let (llm, _) = recording_llm("Still here.");
    let generator = ResponseGenerator::new(DbClient::new(Arc::new(db)), LlmClient::new(Arc::new(llm)), 10);

    assert_eq!(generator.generate("anything", "Ada", UserId(1)).await, "Still here.");
}

#[tokio::test]
async fn test_bot_name_is_replaced_with_user_name() {
    let db = DbClient::memory();
    let (llm, _) = recording_llm("Thunder Byte thinks Thunder Byte is great.");
    let generator = generator(db.clone(), llm);
    generator.set_bot_name("Thunder Byte");
    generator.set_bot_name("Someone Else");

    let reply = generator.generate("hello", "Ada", UserId(5)).await;

    assert_eq!(reply, "Ada thinks Ada is great.");
    assert_eq!(db.get_history(UserId(5)).await.unwrap()[1], HistoryRecord::assistant("Ada thinks Ada is great."));
}

#[tokio::test]
async fn test_histories_are_isolated_per_user() {
    let db = DbClient::memory();
    let (llm, seen) = recording_llm("ok");
    let generator = generator(db.clone(), llm);

    generator.generate("from alice", "Alice", UserId(1)).await;
    generator.generate("from bob", "Bob", UserId(2)).await;

    let sent = seen.lock().unwrap().clone();
    assert!(!sent[1].contains("from alice"));
    assert_eq!(db.get_history(UserId(2)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_reset_clears_history() {
    let db = DbClient::memory();
    let (llm, _) = recording_llm("ok");
    let generator = generator(db.clone(), llm);
    let user = UserId(9);

    generator.generate("hello", "Ada", user).await;
    generator.reset(user).await.unwrap();
    generator.reset(user).await.unwrap();

    assert!(db.get_history(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_surreal_backend_round_trip() {
    let db = DbClient::surreal_memory().await.expect("Failed to create DB client");
    let (llm, _) = recording_llm("Persisted.");
    let generator = generator(db.clone(), llm);
    let user = UserId(777);

    generator.generate("first", "Ada", user).await;
    generator.generate("second", "Ada", user).await;

    assert_eq!(
        db.get_history(user).await.unwrap(),
        vec![
            HistoryRecord::human("first"),
            HistoryRecord::assistant("Persisted."),
            HistoryRecord::human("second"),
            HistoryRecord::assistant("Persisted."),
        ]
    );
}

#[tokio::test]
async fn test_pending_generation_does_not_block_other_users() {
    let db = DbClient::memory();
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let llm = GatedLlm { started: started.clone(), release: release.clone() };
    let generator = ResponseGenerator::new(db.clone(), LlmClient::new(Arc::new(llm)), 10);

    let slow = tokio::spawn({
        let generator = generator.clone();
        async move { generator.generate("slow question", "Ada", UserId(1)).await }
    });

    started.notified().await;

    let fast = tokio::time::timeout(Duration::from_secs(5), generator.generate("quick question", "Bob", UserId(2)))
        .await
        .expect("a pending generation blocked another user");

    assert_eq!(fast, "fast reply");
    assert!(!slow.is_finished());
    assert!(db.get_history(UserId(1)).await.unwrap().is_empty());

    release.notify_one();

    assert_eq!(slow.await.unwrap(), "slow reply");
    assert_eq!(db.get_history(UserId(1)).await.unwrap(), vec![HistoryRecord::human("slow question"), HistoryRecord::assistant("slow reply")]);
    assert_eq!(db.get_history(UserId(2)).await.unwrap(), vec![HistoryRecord::human("quick question"), HistoryRecord::assistant("fast reply")]);
}

// Chunked emission.

#[tokio::test]
async fn test_emit_sends_chunks_in_order() {
    let text = format!("{}{}{}", "a".repeat(MESSAGE_LIMIT), "b".repeat(MESSAGE_LIMIT), "c".repeat(500));

    let mut seq = Sequence::new();
    let mut sink = MockSink::new();
    sink.expect_send().times(1).in_sequence(&mut seq).withf(|text| text.len() == 2000 && text.starts_with('a')).returning(|_| Ok(()));
    sink.expect_send().times(1).in_sequence(&mut seq).withf(|text| text.len() == 2000 && text.starts_with('b')).returning(|_| Ok(()));
    sink.expect_send().times(1).in_sequence(&mut seq).withf(|text| text.len() == 500 && text.starts_with('c')).returning(|_| Ok(()));

    chunk::emit(&text, &sink).await.unwrap();
}

#[tokio::test]
async fn test_emit_boundaries() {
    let (sink, sent) = recording_sink();
    chunk::emit(&"x".repeat(2000), &sink).await.unwrap();
    assert_eq!(sent.lock().unwrap().len(), 1);

    let (sink, sent) = recording_sink();
    chunk::emit(&"x".repeat(2001), &sink).await.unwrap();
    let lengths = sent.lock().unwrap().iter().map(|s| s.len()).collect::<Vec<_>>();
    assert_eq!(lengths, vec![2000, 1]);
}

#[tokio::test]
async fn test_emit_stops_at_first_send_failure() {
    let mut sink = MockSink::new();
    sink.expect_send().times(1).returning(|_| Err(anyhow::anyhow!("channel gone")));

    assert!(chunk::emit(&"x".repeat(4001), &sink).await.is_err());
}

// Commands.

#[tokio::test]
async fn test_science_command_defers_then_follows_up() {
    let db = DbClient::memory();
    let (llm, seen) = recording_llm("Gravity is a force.");
    let state = chat_state(generator(db.clone(), llm));

    let mut seq = Sequence::new();
    let mut replier = MockReplier::new();
    replier.expect_reply().never();
    replier.expect_defer().times(1).in_sequence(&mut seq).returning(|| Ok(()));
    replier
        .expect_follow_up()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|text, private| text.starts_with("Gravity is a force.") && !*private)
        .returning(|_, _| Ok(()));

    chat_event::handle_command(&state, "science", &options(&[("question", "What is gravity?")]), &invoker(10), &replier).await;

    assert!(seen.lock().unwrap()[0].ends_with(&prompts::science("What is gravity?")));
    assert_eq!(db.get_history(UserId(10)).await.unwrap()[0], HistoryRecord::human(prompts::science("What is gravity?")));
}

#[tokio::test]
async fn test_ask_command_refuses_denylisted_question() {
    let mut llm = MockLlm::new();
    llm.expect_generate_content().never();
    let state = chat_state(generator(DbClient::memory(), llm));

    let mut replier = MockReplier::new();
    replier.expect_defer().never();
    replier
        .expect_reply()
        .times(1)
        .withf(|text, private| text.starts_with(prompts::POLICY_REFUSAL) && *private)
        .returning(|_, _| Ok(()));

    chat_event::handle_command(&state, "ask", &options(&[("question", "something inappropriate")]), &invoker(11), &replier).await;
}

#[tokio::test]
async fn test_repeated_command_hits_cooldown() {
    let (llm, _) = recording_llm("Knock knock.");
    let state = chat_state(generator(DbClient::memory(), llm));

    let mut first = MockReplier::new();
    first.expect_defer().times(1).returning(|| Ok(()));
    first.expect_follow_up().times(1).returning(|_, _| Ok(()));
    chat_event::handle_command(&state, "joke", &HashMap::new(), &invoker(12), &first).await;

    let mut second = MockReplier::new();
    second.expect_defer().never();
    second
        .expect_reply()
        .times(1)
        .withf(|text, private| text.starts_with("This command is on cooldown. Try again in") && *private)
        .returning(|_, _| Ok(()));
    chat_event::handle_command(&state, "joke", &HashMap::new(), &invoker(12), &second).await;
}

#[tokio::test]
async fn test_about_command_replies_with_intro() {
    let mut llm = MockLlm::new();
    llm.expect_generate_content().never();
    let state = chat_state(generator(DbClient::memory(), llm));

    let mut replier = MockReplier::new();
    replier
        .expect_reply()
        .times(1)
        .withf(|text, private| text.contains("What I Can Do") && !*private)
        .returning(|_, _| Ok(()));

    chat_event::handle_command(&state, "about", &HashMap::new(), &invoker(13), &replier).await;
}

#[tokio::test]
async fn test_reset_command_clears_and_acknowledges_privately() {
    let db = DbClient::memory();
    let (llm, _) = recording_llm("ok");
    let state = chat_state(generator(db.clone(), llm));
    let user = UserId(14);

    db.set_history(user, &[HistoryRecord::human("q"), HistoryRecord::assistant("a")]).await.unwrap();

    let mut replier = MockReplier::new();
    replier
        .expect_reply()
        .times(1)
        .withf(|text, private| text.starts_with(prompts::RESET_ACKNOWLEDGEMENT) && *private)
        .returning(|_, _| Ok(()));

    chat_event::handle_command(&state, "reset", &HashMap::new(), &invoker(14), &replier).await;

    assert!(db.get_history(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_command_reports_error_privately() {
    let (llm, _) = recording_llm("ok");
    let state = chat_state(generator(DbClient::memory(), llm));

    let mut replier = MockReplier::new();
    replier
        .expect_reply()
        .times(1)
        .withf(|text, private| text.starts_with(prompts::COMMAND_ERROR) && *private)
        .returning(|_, _| Ok(()));

    chat_event::handle_command(&state, "weather", &HashMap::new(), &invoker(15), &replier).await;
}

#[tokio::test]
async fn test_failed_follow_up_reports_error_as_follow_up() {
    let (llm, _) = recording_llm("ok");
    let state = chat_state(generator(DbClient::memory(), llm));

    let mut seq = Sequence::new();
    let mut replier = MockReplier::new();
    replier.expect_reply().never();
    replier.expect_defer().times(1).returning(|| Ok(()));
    replier
        .expect_follow_up()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|_, private| !*private)
        .returning(|_, _| Err(anyhow::anyhow!("webhook expired")));
    replier
        .expect_follow_up()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|text, private| text.starts_with(prompts::COMMAND_ERROR) && *private)
        .returning(|_, _| Ok(()));

    chat_event::handle_command(&state, "math", &options(&[("problem", "1 + 1")]), &invoker(16), &replier).await;
}

// Mentions.

#[tokio::test]
async fn test_mention_uses_persona_template_and_pings_user() {
    let (llm, seen) = recording_llm("Peace be with you.");
    let state = chat_state(generator(DbClient::memory(), llm));
    let (sink, sent) = recording_sink();

    chat_event::handle_mention(&state, 42, "<@42> how do I find calm?", None, &invoker(20), &sink).await;

    assert!(seen.lock().unwrap()[0].ends_with(&prompts::mention("how do I find calm?")));
    assert_eq!(sent.lock().unwrap().clone(), vec!["<@20>! ⚡️\n\nPeace be with you.".to_string()]);
}

#[tokio::test]
async fn test_mention_reply_uses_referenced_message_verbatim() {
    let (llm, seen) = recording_llm("Because of Rayleigh scattering.");
    let state = chat_state(generator(DbClient::memory(), llm));
    let (sink, _) = recording_sink();

    chat_event::handle_mention(&state, 42, "<@42>", Some("<@42> why is the sky blue?"), &invoker(21), &sink).await;

    let sent = seen.lock().unwrap()[0].clone();
    assert!(sent.ends_with(&format!("{}why is the sky blue?", prompts::HISTORY_SUFFIX)));
}

#[tokio::test]
async fn test_mention_intro_skips_generation() {
    let mut llm = MockLlm::new();
    llm.expect_generate_content().never();
    let db = DbClient::memory();
    let state = chat_state(generator(db.clone(), llm));
    let (sink, sent) = recording_sink();

    chat_event::handle_mention(&state, 42, "<@42> who are you?", None, &invoker(22), &sink).await;

    assert!(sent.lock().unwrap().concat().contains("What I Can Do"));
    assert!(db.get_history(UserId(22)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_long_mention_reply_is_chunked() {
    let long: &'static str = Box::leak("z".repeat(2500).into_boxed_str());
    let (llm, _) = recording_llm(long);
    let state = chat_state(generator(DbClient::memory(), llm));
    let (sink, sent) = recording_sink();

    chat_event::handle_mention(&state, 42, "<@42> talk a lot", None, &invoker(23), &sink).await;

    let sent = sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].chars().count(), MESSAGE_LIMIT);
    assert_eq!(sent.concat(), format!("<@23>! ⚡️\n\n{long}"));
}
