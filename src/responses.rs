//! Canned fallback replies and the keyword tables that select them.
//!
//! When the remote reply service is unreachable, the assistant answers from
//! this bank. Selection is deliberately simple:
//!
//! 1. Lowercase the input.
//! 2. Scan groups in declared order (services → navigation → support →
//!    portfolio → general).
//! 3. The first group with any substring match wins; one of its replies is
//!    drawn uniformly at random.
//!
//! Matching is non-tokenized substring matching, so short patterns like
//! "ok" can match inside unrelated words. That looseness is intentional and
//! pinned by tests; do not switch to word-boundary matching without checking
//! which canned replies existing inputs land on.

use crate::message::Category;

/// A suggested utterance the host can render as a chip under a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickAction {
    /// Stable identifier the host passes back on tap.
    pub id: &'static str,
    /// Chip label; submitted verbatim as a user turn when tapped.
    pub label: &'static str,
    /// Bank category the chip relates to.
    pub category: Category,
}

/// One bucket of the fallback bank: keywords in, canned replies out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseGroup {
    /// Category the group belongs to.
    pub category: Category,
    /// Lowercase substrings that select this group.
    pub patterns: &'static [&'static str],
    /// Reply variants, one drawn uniformly at random.
    pub replies: &'static [&'static str],
    /// Follow-up categories to suggest after the reply. Empty = no chips.
    pub follow_ups: &'static [Category],
}

/// Greeting shown as the synthetic first message of every fresh session.
pub const WELCOME_TEXT: &str = "Hi! I'm Pixie, the site assistant. I can help with retouching \
     services, pricing, orders and finding your way around. What can I do for you?";

/// Chips offered under the welcome message and after replies that declare
/// follow-ups.
pub const QUICK_ACTIONS: &[QuickAction] = &[
    QuickAction {
        id: "services",
        label: "Услуги",
        category: Category::Services,
    },
    QuickAction {
        id: "navigation",
        label: "Навигация",
        category: Category::Navigation,
    },
    QuickAction {
        id: "portfolio",
        label: "Портфолио",
        category: Category::Portfolio,
    },
    QuickAction {
        id: "support",
        label: "Поддержка",
        category: Category::Support,
    },
];

// ── Response bank ───────────────────────────────────────────────────────
//
// Scan order matters twice over: categories are tried services first, and
// within services the pricing group comes before the general retouching
// group so that price questions mentioning a service ("сколько стоит
// ретушь?") land on pricing.

/// The fallback bank, in scan order.
pub const RESPONSE_BANK: &[ResponseGroup] = &[
    // ── Services ────────────────────────────────────────────────────────
    ResponseGroup {
        category: Category::Services,
        patterns: &[
            "price",
            "cost",
            "how much",
            "pricing",
            "цена",
            "стоимость",
            "сколько",
            "прайс",
        ],
        replies: &[
            "Retouching starts at $5 per photo for basic cleanup. Detailed pricing for every \
             service is on the [pricing page](/pricing).",
            "Prices depend on the service: basic retouching from $5, full restoration from $15 \
             per photo. The [pricing page](/pricing) has the complete list.",
            "The full price list lives on the [pricing page](/pricing). Most orders are priced \
             per photo, with volume discounts from 20 photos up.",
        ],
        follow_ups: &[Category::Services, Category::Support],
    },
    ResponseGroup {
        category: Category::Services,
        patterns: &[
            "retouch",
            "ретушь",
            "ретушир",
            "skin",
            "portrait",
            "портрет",
            "обработк",
            "photo editing",
        ],
        replies: &[
            "We offer portrait retouching, skin cleanup, background replacement and full photo \
             restoration. The complete list is on the [services page](/services).",
            "Our retouchers handle everything from light skin cleanup to full editorial \
             retouching. Have a look at [services](/services) to pick what fits.",
            "Portrait retouching is our main craft. Upload a photo from your \
             [account](/account) and we'll take it from there.",
        ],
        follow_ups: &[Category::Portfolio, Category::Services],
    },
    ResponseGroup {
        category: Category::Services,
        patterns: &[
            "restor",
            "реставрац",
            "old photo",
            "старое фото",
            "color",
            "цвет",
            "коррекц",
            "correction",
        ],
        replies: &[
            "We restore old and damaged photos, including tears, stains and faded colors. \
             Examples are in the [portfolio](/portfolio).",
            "Color correction and restoration are both available. Upload the photo from your \
             [account](/account) and we'll assess it for free.",
        ],
        follow_ups: &[Category::Portfolio],
    },
    // ── Navigation ──────────────────────────────────────────────────────
    ResponseGroup {
        category: Category::Navigation,
        patterns: &[
            "как найти",
            "где",
            "навигац",
            "меню",
            "каталог",
            "find",
            "menu",
            "catalog",
        ],
        replies: &[
            "All services are listed in the [catalog](/services). Tell me what you're after \
             and I'll point you to the right page.",
            "Use the top menu, or go straight to the [catalog](/services). Your orders live \
             in your [account](/account).",
        ],
        follow_ups: &[Category::Services, Category::Portfolio],
    },
    ResponseGroup {
        category: Category::Navigation,
        patterns: &[
            "account",
            "login",
            "sign in",
            "аккаунт",
            "кабинет",
            "войти",
            "профиль",
            "регистрац",
        ],
        replies: &[
            "Your orders, uploads and invoices are in your [account](/account). Signing in \
             takes one click with email or Google.",
            "To place an order you'll need an [account](/account). Registration is free.",
        ],
        follow_ups: &[],
    },
    ResponseGroup {
        category: Category::Navigation,
        patterns: &["contact", "контакт", "email", "почта", "связаться"],
        replies: &[
            "You can reach the team through the [contact page](/contact) or by email. We \
             reply within one business day.",
            "The quickest way is the form on the [contact page](/contact).",
        ],
        follow_ups: &[Category::Support],
    },
    // ── Support ─────────────────────────────────────────────────────────
    ResponseGroup {
        category: Category::Support,
        patterns: &[
            "help",
            "помо",
            "support",
            "поддержк",
            "problem",
            "проблем",
            "не работает",
            "not working",
            "вопрос",
            "question",
        ],
        replies: &[
            "I'm here to help. Describe the problem and I'll do my best, or leave a request \
             on the [contact page](/contact).",
            "Tell me what's going wrong and I'll point you in the right direction. For order \
             issues, the [FAQ](/faq) covers the common cases.",
            "Happy to help. If it's about an existing order, check its status in your \
             [account](/account) first.",
        ],
        follow_ups: &[Category::Services, Category::Navigation],
    },
    ResponseGroup {
        category: Category::Support,
        patterns: &["order", "заказ", "status", "статус", "track", "готов"],
        replies: &[
            "Order status is shown in your [account](/account) under Orders. You'll also get \
             an email when it's ready.",
            "You can track every order in your [account](/account). If something looks stuck, \
             ping us via the [contact page](/contact).",
        ],
        follow_ups: &[Category::Support],
    },
    ResponseGroup {
        category: Category::Support,
        patterns: &[
            "how long",
            "срок",
            "deadline",
            "когда будет",
            "turnaround",
            "ожидан",
        ],
        replies: &[
            "Standard turnaround is 24-72 hours depending on the service. Rush delivery is \
             available at checkout.",
            "Most orders are ready within 48 hours. Complex restorations can take up to a \
             week.",
        ],
        follow_ups: &[Category::Services],
    },
    // ── Portfolio ───────────────────────────────────────────────────────
    ResponseGroup {
        category: Category::Portfolio,
        patterns: &[
            "portfolio",
            "портфолио",
            "example",
            "пример",
            "работы",
            "your work",
            "до и после",
            "before",
        ],
        replies: &[
            "Before/after examples for every service are in the [portfolio](/portfolio).",
            "Have a look at the [portfolio](/portfolio). It's sorted by service, so you can \
             see exactly what each one does.",
        ],
        follow_ups: &[Category::Services],
    },
    // ── General ─────────────────────────────────────────────────────────
    ResponseGroup {
        category: Category::General,
        patterns: &["привет", "здравств", "добрый", "hello", "hi", "hey"],
        replies: &[
            "Hey! How can I help today?",
            "Hello! I can help with services, pricing, your order, and finding pages on the \
             site.",
            "Hi! What can I do for you?",
        ],
        follow_ups: &[Category::Services, Category::Portfolio, Category::Support],
    },
    ResponseGroup {
        category: Category::General,
        patterns: &["thank", "спасибо", "благодар", "thx"],
        replies: &[
            "You're welcome! Anything else I can help with?",
            "Glad to help! Come back any time.",
        ],
        follow_ups: &[],
    },
    ResponseGroup {
        category: Category::General,
        patterns: &["ok", "ок", "хорошо", "понятно", "ладно", "got it"],
        replies: &[
            "Great. I'm around if anything else comes up.",
            "Perfect. Happy retouching!",
        ],
        follow_ups: &[Category::Services, Category::Support],
    },
    ResponseGroup {
        category: Category::General,
        patterns: &["who are you", "кто ты", "what are you", "что ты", "бот", "bot"],
        replies: &[
            "I'm Pixie, the site assistant. I answer questions about services, prices and \
             orders, and I keep working even when the connection doesn't.",
            "A little helper built into the site. Ask me about retouching services or where \
             to find things.",
        ],
        follow_ups: &[],
    },
];

/// Bucket used when no group matches.
pub const DEFAULT_GROUP: &ResponseGroup = &ResponseGroup {
    category: Category::General,
    patterns: &[],
    replies: &[
        "I didn't quite catch that. Could you rephrase? I'm best with questions about \
         services, pricing and orders.",
        "Hmm, not sure I understood. Try asking about our services, prices or your order, \
         or pick one of the options below.",
        "I don't have a good answer for that yet. The [contact page](/contact) reaches a \
         human, or try one of the options below.",
    ],
    follow_ups: &[Category::Services, Category::Support, Category::Navigation],
};

/// Find the first group whose patterns match the input, in scan order.
///
/// Case-insensitive substring matching; returns `None` when nothing matches
/// (callers then draw from [`DEFAULT_GROUP`]).
pub fn find_group(input: &str) -> Option<&'static ResponseGroup> {
    let lower = input.to_lowercase();
    RESPONSE_BANK
        .iter()
        .find(|group| group.patterns.iter().any(|pattern| lower.contains(pattern)))
}

/// Draw one reply uniformly at random from the group.
pub fn pick_reply(group: &ResponseGroup) -> &'static str {
    let idx = (rand::random::<f64>() * group.replies.len() as f64) as usize;
    group.replies.get(idx).copied().unwrap_or_default()
}

/// Look up a quick action by its stable id.
pub fn quick_action(id: &str) -> Option<&'static QuickAction> {
    QUICK_ACTIONS.iter().find(|action| action.id == id)
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn category_rank(category: Category) -> usize {
        match category {
            Category::Services => 0,
            Category::Navigation => 1,
            Category::Support => 2,
            Category::Portfolio => 3,
            Category::General => 4,
        }
    }

    // ── Bank shape ──────────────────────────────────────────────────────

    #[test]
    fn every_group_has_patterns_and_replies() {
        for group in RESPONSE_BANK {
            assert!(!group.patterns.is_empty(), "{:?} has no patterns", group.category);
            assert!(!group.replies.is_empty(), "{:?} has no replies", group.category);
            for reply in group.replies {
                assert!(!reply.is_empty());
            }
        }
        assert!(!DEFAULT_GROUP.replies.is_empty());
        assert!(!WELCOME_TEXT.is_empty());
    }

    #[test]
    fn patterns_are_lowercase() {
        // find_group lowercases the input, so an uppercase pattern could
        // never match.
        for group in RESPONSE_BANK {
            for pattern in group.patterns {
                assert_eq!(*pattern, pattern.to_lowercase(), "pattern {pattern:?}");
            }
        }
    }

    #[test]
    fn categories_appear_in_scan_order() {
        let ranks: Vec<usize> = RESPONSE_BANK
            .iter()
            .map(|g| category_rank(g.category))
            .collect();
        for pair in ranks.windows(2) {
            assert!(pair[0] <= pair[1], "bank categories out of scan order");
        }
        assert_eq!(ranks.first(), Some(&0), "services must be scanned first");
    }

    #[test]
    fn pricing_group_is_declared_before_retouching() {
        let price_idx = RESPONSE_BANK
            .iter()
            .position(|g| g.patterns.contains(&"цена"))
            .unwrap();
        let retouch_idx = RESPONSE_BANK
            .iter()
            .position(|g| g.patterns.contains(&"ретушь"))
            .unwrap();
        assert!(price_idx < retouch_idx);
    }

    #[test]
    fn default_group_offers_follow_ups() {
        assert_eq!(DEFAULT_GROUP.replies.len(), 3);
        assert_eq!(
            DEFAULT_GROUP.follow_ups,
            &[Category::Services, Category::Support, Category::Navigation]
        );
    }

    #[test]
    fn quick_action_ids_are_unique_and_resolvable() {
        for action in QUICK_ACTIONS {
            let found = quick_action(action.id).unwrap();
            assert_eq!(found.label, action.label);
        }
        assert!(quick_action("nonsense").is_none());
        let mut ids: Vec<&str> = QUICK_ACTIONS.iter().map(|a| a.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), QUICK_ACTIONS.len());
    }

    // ── Matching ────────────────────────────────────────────────────────

    #[test]
    fn russian_price_question_lands_on_pricing() {
        let group = find_group("сколько стоит ретушь?").unwrap();
        assert_eq!(group.category, Category::Services);
        assert!(group.patterns.contains(&"сколько"));
        assert!(!group.follow_ups.is_empty());
    }

    #[test]
    fn matching_ignores_case() {
        let group = find_group("I need RETOUCH help").unwrap();
        assert_eq!(group.category, Category::Services);
        assert!(group.patterns.contains(&"retouch"));
    }

    #[test]
    fn first_match_wins_across_categories() {
        // "price" (services) and "help" (support) both match; services is
        // scanned first.
        let group = find_group("help me with the price").unwrap();
        assert_eq!(group.category, Category::Services);
        assert!(group.patterns.contains(&"price"));
    }

    #[test]
    fn substring_matching_is_not_tokenized() {
        // "looking" contains "ok"; nothing earlier in the bank matches, so
        // the ack group fires. Intentional looseness.
        let group = find_group("looking around").unwrap();
        assert_eq!(group.category, Category::General);
        assert!(group.patterns.contains(&"ok"));
    }

    #[test]
    fn unmatched_input_returns_none() {
        assert!(find_group("zzz qqq www").is_none());
    }

    #[test]
    fn empty_input_returns_none() {
        assert!(find_group("").is_none());
    }

    // ── Reply drawing ───────────────────────────────────────────────────

    #[test]
    fn pick_reply_draws_from_the_group() {
        let group = find_group("привет").unwrap();
        for _ in 0..50 {
            let reply = pick_reply(group);
            assert!(group.replies.contains(&reply));
        }
    }

    #[test]
    fn pick_reply_covers_all_variants_eventually() {
        let group = DEFAULT_GROUP;
        let mut seen = vec![false; group.replies.len()];
        for _ in 0..200 {
            let reply = pick_reply(group);
            if let Some(pos) = group.replies.iter().position(|r| *r == reply) {
                seen[pos] = true;
            }
        }
        assert!(seen.iter().all(|s| *s), "200 draws should hit all 3 variants");
    }
}
