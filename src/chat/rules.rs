//! Ordered rule table for canned chat replies.
//!
//! Rules are evaluated top to bottom against the lowercased message and the
//! first match wins. Matching is plain substring containment, so short
//! keywords also hit inside longer words ("hi" in "shipping").

use tracing::debug;

/// Topic a rule answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Greeting,
    Pricing,
    Product,
    Contact,
    Location,
    Delivery,
    Quality,
    Fallback,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Greeting => "greeting",
            Category::Pricing => "pricing",
            Category::Product => "product",
            Category::Contact => "contact",
            Category::Location => "location",
            Category::Delivery => "delivery",
            Category::Quality => "quality",
            Category::Fallback => "fallback",
        }
    }
}

/// A single predicate/reply pair.
#[derive(Debug, Clone)]
pub struct Rule {
    pub category: Category,
    /// Matches if the lowercased message contains any of these.
    pub contains: &'static [&'static str],
    /// Matches if the lowercased message equals any of these.
    pub exact: &'static [&'static str],
    pub reply: &'static str,
}

impl Rule {
    /// Test the rule against an already-lowercased message.
    pub fn matches(&self, lowered: &str) -> bool {
        self.contains.iter().any(|k| lowered.contains(k)) || self.exact.iter().any(|e| lowered == *e)
    }
}

/// Reply used when no rule matches.
pub const FALLBACK_REPLY: &str = "Thank you for your message. For specific information about our spices or business inquiries, please contact our team at vijayakumar@inochiinternational.in or call +919535520948";

/// The rule table. Order is significant.
pub static RULES: &[Rule] = &[
    Rule {
        category: Category::Greeting,
        contains: &["hello", "hi"],
        exact: &["jjgg"],
        reply: "Hello! How can I assist you with our spice products today?",
    },
    Rule {
        category: Category::Pricing,
        contains: &["price", "cost", "rate"],
        exact: &[],
        reply: "For detailed pricing information of our spices, please email us at vijayakumar@inochiinternational.in or call us at +919535520948",
    },
    Rule {
        category: Category::Product,
        contains: &["product", "spice", "items"],
        exact: &[],
        reply: "We offer a wide range of premium spices including:\n- Black Pepper\n- Cardamom\n- Cinnamon\n- Cloves\n- Turmeric\nand many more. Which spice would you like to know more about?",
    },
    Rule {
        category: Category::Contact,
        contains: &["contact", "reach", "call"],
        exact: &[],
        reply: "You can reach us through:\nEmail: vijayakumar@inochiinternational.in\nPhone: +919535520948\nWe typically respond within 24 hours.",
    },
    Rule {
        category: Category::Location,
        contains: &["location", "address", "where"],
        exact: &[],
        reply: "We are headquartered in India and serve customers globally. For our detailed address, please contact our team.",
    },
    Rule {
        category: Category::Delivery,
        contains: &["delivery", "shipping"],
        exact: &[],
        reply: "We offer worldwide shipping with various options:\n- Standard shipping\n- Express delivery\n- Bulk cargo shipping\nDelivery times vary by location. Please contact us for specific shipping details to your region.",
    },
    Rule {
        category: Category::Quality,
        contains: &["quality", "standard", "certificate"],
        exact: &[],
        reply: "We maintain the highest quality standards with certifications including:\n- ISO Certification\n- FSSAI Registration\n- Export License\nAll our products undergo strict quality control measures.",
    },
];

/// Pick the reply for a message.
///
/// Returns the category alongside the reply so callers can log which rule fired.
pub fn respond(message: &str) -> (Category, &'static str) {
    let lowered = message.to_lowercase();

    let hit = RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| (rule.category, rule.reply))
        .unwrap_or((Category::Fallback, FALLBACK_REPLY));

    debug!(category = hit.0.as_str(), "Chat rule matched");
    hit
}
