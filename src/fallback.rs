//! Canned replies used when the backend can't be reached

pub const GREETING_REPLY: &str = "Olá! 👋 Em que posso ajudar?";
pub const INSTITUTION_REPLY: &str = "O ISEL é uma excelente escola de engenharia! 🎓";
pub const THANKS_REPLY: &str = "De nada! 😊 Se precisares de mais alguma coisa, estou aqui.";
pub const CONTINUATION_REPLY: &str = "Interessante! Podes dar-me mais detalhes?";

const GREETING_TOKENS: &[&str] = &["olá", "ola", "oi"];
const INSTITUTION_TOKEN: &str = "isel";
const THANKS_PREFIX: &str = "obrigad";

/// Pick a local reply for `user_text`. First matching rule wins.
pub fn fallback(user_text: &str) -> String {
    let lowered = user_text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let reply = if words.iter().any(|w| GREETING_TOKENS.contains(w)) {
        GREETING_REPLY
    } else if words.iter().any(|w| *w == INSTITUTION_TOKEN) {
        INSTITUTION_REPLY
    } else if words.iter().any(|w| w.starts_with(THANKS_PREFIX)) {
        THANKS_REPLY
    } else {
        CONTINUATION_REPLY
    };

    reply.to_string()
}
