use crate::parsers::text::{self, Fragment, GENERAL};

#[cfg(test)]
mod unit_tests {
    use super::*;

    fn texts(fragments: &[Fragment]) -> Vec<&str> {
        fragments.iter().map(|f| f.text.as_str()).collect()
    }

    #[test]
    fn test_split_on_questions() {
        let result = text::split_on_questions("What is DQR? A dynamic QR. Is it free? Yes.");
        assert_eq!(
            texts(&result),
            vec!["What is DQR?", "A dynamic QR. Is it free?", "Yes."]
        );

        // Lowercase after the mark is not a break
        let result = text::split_on_questions("Really? yes. Fine");
        assert_eq!(result.len(), 1);

        assert!(text::split_on_questions("   ").is_empty());
    }

    #[test]
    fn test_split_on_keywords() {
        let result = text::split_on_keywords("Intro text. Refunds Take five days. DQR Scan it.");
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].label, None);
        assert_eq!(result[0].text, "Intro text. ");
        assert_eq!(result[1].label.as_deref(), Some("Refunds"));
        assert_eq!(result[1].text, " Take five days. ");
        assert_eq!(result[2].label.as_deref(), Some("DQR"));

        // A keyword with nothing after it contributes no fragment
        let result = text::split_on_keywords("Some words Voucher");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].label, None);

        assert!(text::split_on_keywords("no topics").is_empty());
    }

    #[test]
    fn test_split_on_interrogatives() {
        let result = text::split_on_interrogatives("Intro. What now. How so");
        assert_eq!(texts(&result), vec!["Intro. ", "What now. ", "How so"]);

        // "Isle" is not the word "Is"
        let result = text::split_on_interrogatives("Isle of Man");
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_assign_sections() {
        let fragments = vec![
            Fragment {
                label: None,
                text: "Opening remarks here.".to_string(),
            },
            Fragment {
                label: Some("Campaign".to_string()),
                text: "How do I start a campaign".to_string(),
            },
            Fragment {
                label: None,
                text: " Tiny ".to_string(),
            },
            Fragment {
                label: None,
                text: "Also see Notifications for alerts.".to_string(),
            },
        ];

        let sections = text::assign_sections(fragments);
        assert_eq!(sections[GENERAL], "Opening remarks here.");
        assert_eq!(sections["Campaign"], "How do I start a campaign?");
        assert_eq!(sections["Notifications"], "Also see Notifications for alerts.");
    }

    #[test]
    fn test_bucket_questions() {
        let sections = text::bucket_questions(
            "Can I add a user?\nHow do refunds work?\nWhy is the sky blue?",
        );
        assert_eq!(sections["User Management"], "Can I add a user?");
        assert_eq!(sections["Refunds"], "How do refunds work?");
        assert_eq!(sections[GENERAL], "Why is the sky blue?");

        assert!(text::bucket_questions("No questions at all.").is_empty());
    }

    #[test]
    fn test_close_question() {
        assert_eq!(text::close_question("Where is my payout"), "Where is my payout?");
        assert_eq!(text::close_question("Where is my payout!"), "Where is my payout!");
        assert_eq!(text::close_question("Payouts run daily"), "Payouts run daily");
        assert_eq!(text::close_question("Whoever asks"), "Whoever asks");
    }

    #[test]
    fn test_has_topic_keyword() {
        assert!(text::has_topic_keyword("see Partner program"));
        assert!(text::has_topic_keyword("P2PM / Low KYC merchants"));
        assert!(!text::has_topic_keyword("partner program"));
        assert!(!text::has_topic_keyword("Refundsx"));
    }
}
