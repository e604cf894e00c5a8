/// Whether `topic` matches the subscription `filter`, with MQTT 3.1.1
/// wildcard rules: `+` matches one level, a trailing `#` matches the parent
/// level and everything below it.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    // Wildcards never match topics starting with '$'
    if topic.starts_with('$') && (filter.starts_with('+') || filter.starts_with('#')) {
        return false;
    }

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return filter_levels.next().is_none(),
            (Some("+"), Some(_)) => continue,
            (Some(f), Some(t)) if f == t => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(topic_matches("smartbite/sensor/lectura", "smartbite/sensor/lectura"));
        assert!(!topic_matches("smartbite/sensor/lectura", "smartbite/sensor"));
        assert!(!topic_matches("smartbite/sensor", "smartbite/sensor/lectura"));
    }

    #[test]
    fn test_single_level_wildcard() {
        assert!(topic_matches("smartbite/+/lectura", "smartbite/sensor/lectura"));
        assert!(!topic_matches("smartbite/+", "smartbite/sensor/lectura"));
        assert!(topic_matches("+/+/+", "a/b/c"));
    }

    #[test]
    fn test_multi_level_wildcard() {
        assert!(topic_matches("smartbite/#", "smartbite/sensor/lectura"));
        assert!(topic_matches("smartbite/#", "smartbite"));
        assert!(topic_matches("#", "anything/at/all"));
        assert!(!topic_matches("smartbite/#/x", "smartbite/a/x"));
    }

    #[test]
    fn test_dollar_topics_need_explicit_filter() {
        assert!(!topic_matches("#", "$SYS/uptime"));
        assert!(topic_matches("$SYS/#", "$SYS/uptime"));
    }
}
