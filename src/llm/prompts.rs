//! Prompt and fallback texts for order replies.

/// Persona for the system role.
pub const SYSTEM_PROMPT: &str =
    "Ты программист-фрилансер. Пиши вежливо, уверенно. Предложи сделать задачу, укажи контакт.";

/// User-role message embedding the task description.
pub fn user_prompt(description: &str) -> String {
    format!("Есть задача: {description}. Сгенерируй короткий отклик от разработчика.")
}

/// Canned reply used whenever generation fails.
pub fn fallback_reply(contact: &str) -> String {
    format!("Здравствуйте! Ознакомился с заданием. Готов выполнить. Мой Telegram: {contact}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_embeds_description() {
        assert_eq!(
            user_prompt("парсинг сайта"),
            "Есть задача: парсинг сайта. Сгенерируй короткий отклик от разработчика."
        );
    }

    #[test]
    fn fallback_reply_ends_with_contact() {
        let reply = fallback_reply("@dev_handle");
        assert!(reply.starts_with("Здравствуйте!"));
        assert!(reply.ends_with("Мой Telegram: @dev_handle"));
    }
}
