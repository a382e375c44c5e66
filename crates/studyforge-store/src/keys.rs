use studyforge_core::model::SessionId;

pub const KEY_PREFIX: &str = "studyforge";
pub const MISTAKE_BOOK_KEY: &str = "studyforge:mistake_book";

pub fn exam_key(session: &SessionId) -> String {
    format!("{KEY_PREFIX}:exam:{session}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exam_keys_are_per_session() {
        assert_eq!(exam_key(&SessionId::default()), "studyforge:exam:default");
        assert_ne!(exam_key(&SessionId::new("a")), exam_key(&SessionId::new("b")));
    }
}
