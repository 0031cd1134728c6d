//! Persona prompt templates and canned texts.

use rand::seq::IndexedRandom;

/// Opens the history-augmented prompt.
pub const HISTORY_PREAMBLE: &str = "You are chatting with a user. Here is your conversation so far, oldest first:\n\n";

/// Separates the rendered history from the new user input.
pub const HISTORY_SUFFIX: &str = "\nContinue the conversation by responding to the user's latest message:\n\n";

/// Reply to `/ask` when the denylist matches.
pub const POLICY_REFUSAL: &str = "Sorry, I can't answer that question.";

/// Reply to any command failure.
pub const COMMAND_ERROR: &str = "An error occurred while processing your command. Please try again later.";

/// Reply to `/reset`.
pub const RESET_ACKNOWLEDGEMENT: &str = "⚡ Your conversation history has been cleared. Fresh skies ahead!";

/// Story genres used when `/story` is given no theme.
pub const STORY_GENRES: &[&str] = &["sci-fi", "fantasy", "mystery", "romance", "adventure"];

/// Phrases in a mention that ask the bot to introduce itself.
pub const INTRO_PHRASES: &[&str] = &["who are you", "what can you do", "tell me about yourself"];

pub fn science(question: &str) -> String {
    format!("Answer this science question with the divine clarity and wisdom of Shree Krishna: {question}")
}

pub fn math(problem: &str) -> String {
    format!("Solve this math problem and explain the solution with divine wisdom: {problem}")
}

pub fn mythology(topic: &str) -> String {
    format!("Provide information about this mythology topic with the insight and serenity of Shree Krishna: {topic}")
}

pub fn joke(topic: Option<&str>) -> String {
    match topic {
        Some(topic) => format!("Tell a funny joke about {topic}"),
        None => "Tell a random funny joke".to_string(),
    }
}

/// `genre` is only used when there is no theme.
pub fn story(theme: Option<&str>, genre: &str) -> String {
    match theme {
        Some(theme) => format!("Tell a short story about {theme}"),
        None => format!("Tell a short {genre} story"),
    }
}

pub fn advice(topic: &str) -> String {
    format!(
        "Provide life advice on topic mentioned below with the divine wisdom and compassion of Shree Krishna. \
         Include insights from the Bhagavad Gita and relevant parables to illuminate the advice. \
         Also, include a relevant quote from a Disney or Dreamworks movie to support the advice.:\n{topic}"
    )
}

pub fn ask(question: &str) -> String {
    format!("Answer this question with the divine wisdom and grace of Shree Krishna: {question}")
}

pub fn mention(message: &str) -> String {
    format!("Respond to this message with the divine wisdom and grace of Shree Krishna: {message}")
}

// Introduction.

pub const BOT_INTROS: &[&str] = &[
    "🌩️ **Hello, I'm Thunder Byte!** 🌩️\nI'm your new stormy sidekick, crafted with lightning speed and thunderous power of **Storm Splits**!",
    "⚡ **Greetings! Thunder Byte at your service!** ⚡\nForged in the digital storm clouds by the brilliant mind of **Storm Splits**!",
    "🌪️ **Bzzt! Thunder Byte here!** 🌪️\nYour electrifying companion, sparked to life by the **Storm Splits**!",
];

pub const BOT_FEATURES: &[&str] = &[
    "⚡ Answer science questions with electrifying accuracy!",
    "🔢 Solve math problems faster than lightning!",
    "🏛️ Enlighten you with mythological tales from across the ages!",
    "😂 Crack jokes that'll make you roar with laughter!",
    "📚 Spin yarns and tell tales that'll blow you away!",
    "🧠 Offer sage advice backed by ancient wisdom and pop culture!",
];

/// Number of features listed in one introduction.
pub const INTRO_FEATURE_COUNT: usize = 4;

pub const GETTING_STARTED: &str = r#####"
🌩️ **How to Get Started:**
1. Type `/` to see all available commands
2. Choose a command and fill in any required information
3. Hit enter and watch the storm of knowledge unfold!
4. For more fun, try mentioning me in a message!

Remember, I'm always here to help, rain or shine! ⚡🚀
"#####;

/// Render an introduction from one intro and a set of features.
pub fn render_intro(intro: &str, features: &[&str]) -> String {
    format!("{intro}\n\n⚡ **What I Can Do:**\n{}\n\n{GETTING_STARTED}", features.join("\n"))
}

/// A randomized introduction: one intro line and four distinct features.
pub fn bot_intro() -> String {
    let mut rng = rand::rng();

    let intro = BOT_INTROS.choose(&mut rng).copied().unwrap_or_default();
    let features = BOT_FEATURES.sample(&mut rng, INTRO_FEATURE_COUNT).copied().collect::<Vec<_>>();

    render_intro(intro, &features)
}

/// A random genre for themeless stories.
pub fn random_story_genre() -> &'static str {
    STORY_GENRES.choose(&mut rand::rng()).copied().unwrap_or_default()
}

// Tests.
