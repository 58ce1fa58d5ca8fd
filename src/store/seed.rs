//! Built-in seed roster and opening conversations.
//!
//! Seed timestamps are offsets from load time so the roster always reads as
//! recent activity. On load, seed entries missing from persisted data are
//! unioned in; persisted data wins on id collision.

use crate::store::types::{Contact, DeliveryStatus, Message, MessageMap, SenderRole};

pub const SEED_YAH: &str = "ai-yah";
pub const SEED_NARA: &str = "ai-nara";
pub const SEED_MARC: &str = "dev-marc";
pub const SEED_SARAH: &str = "dev-sarah";
pub const SEED_ALEX: &str = "dev-alex";
pub const SEED_SUPPORT: &str = "1";
pub const SEED_ALICE: &str = "2";

struct SeedContact {
    id: &'static str,
    name: &'static str,
    phone_number: &'static str,
    avatar_url: &'static str,
    last_message: &'static str,
    age_ms: u64,
    unread_count: u32,
}

const SEED_CONTACTS: &[SeedContact] = &[
    SeedContact {
        id: SEED_YAH,
        name: "YAH (MGAI 🇲🇬)",
        phone_number: "+261 34 04 999 99",
        avatar_url: "https://images.unsplash.com/photo-1620066127282-3d5f96e42636?auto=format&fit=crop&w=200&q=80",
        last_message: "Manao ahoana tompoko! 🇲🇬",
        age_ms: 10_000,
        unread_count: 1,
    },
    SeedContact {
        id: SEED_NARA,
        name: "Nara",
        phone_number: "+221 77 123 45 67",
        avatar_url: "https://images.unsplash.com/photo-1531123897727-8f129e1688ce?auto=format&fit=crop&w=200&q=80",
        last_message: "Je viens de retrouver cette photo !",
        age_ms: 300_000,
        unread_count: 2,
    },
    SeedContact {
        id: SEED_MARC,
        name: "Marc (Backend Expert)",
        phone_number: "+1 555 019 2834",
        avatar_url: "https://images.unsplash.com/photo-1506794778202-cad84cf45f1d?auto=format&fit=crop&w=200&q=80",
        last_message: "Let's discuss the API schema.",
        age_ms: 50_000,
        unread_count: 1,
    },
    SeedContact {
        id: SEED_SARAH,
        name: "Sarah (Frontend Lead)",
        phone_number: "+1 555 019 5555",
        avatar_url: "https://images.unsplash.com/photo-1494790108377-be9c29b29330?auto=format&fit=crop&w=200&q=80",
        last_message: "The new design system components are ready.",
        age_ms: 150_000,
        unread_count: 0,
    },
    SeedContact {
        id: SEED_ALEX,
        name: "Alex (DevOps Pro)",
        phone_number: "+1 555 019 9999",
        avatar_url: "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?auto=format&fit=crop&w=200&q=80",
        last_message: "Deployment pipeline is green. 🟢",
        age_ms: 600_000,
        unread_count: 0,
    },
    SeedContact {
        id: SEED_SUPPORT,
        name: "Gemini AI Support",
        phone_number: "+1 555 010 2020",
        avatar_url: "https://picsum.photos/seed/gemini/200",
        last_message: "Hello! How can I help you today?",
        age_ms: 800_000,
        unread_count: 0,
    },
    SeedContact {
        id: SEED_ALICE,
        name: "Alice Wonderland",
        phone_number: "+44 7911 123456",
        avatar_url: "https://picsum.photos/seed/alice/200",
        last_message: "See you tomorrow!",
        age_ms: 3_600_000,
        unread_count: 0,
    },
];

pub fn contacts(now_ms: u64) -> Vec<Contact> {
    SEED_CONTACTS
        .iter()
        .map(|seed| Contact {
            id: seed.id.to_string(),
            name: seed.name.to_string(),
            phone_number: seed.phone_number.to_string(),
            avatar_url: Some(seed.avatar_url.to_string()),
            cover_url: None,
            last_message: seed.last_message.to_string(),
            last_message_time: now_ms.saturating_sub(seed.age_ms),
            unread_count: seed.unread_count,
        })
        .collect()
}

pub fn messages(now_ms: u64) -> MessageMap {
    let mut map = MessageMap::new();

    map.insert(
        SEED_YAH.to_string(),
        vec![seed_message(
            "y1",
            SEED_YAH,
            "Manao ahoana tompoko! 👋 YAH no anarako, DI-n'i Madagasikara. Faly mandray anao aho. Ahoana no afahako manampy anao anio? 🇲🇬",
            None,
            now_ms.saturating_sub(10_000),
            DeliveryStatus::Delivered,
        )],
    );

    map.insert(
        SEED_NARA.to_string(),
        vec![
            seed_message(
                "n1",
                SEED_NARA,
                "Salut ! 👋 Je suis Nara. Ravie de faire ta connaissance.",
                None,
                now_ms.saturating_sub(400_000),
                DeliveryStatus::Read,
            ),
            seed_message(
                "n2",
                SEED_NARA,
                "J'adore partager ma culture et mes souvenirs. Regarde, c'était lors de mon dernier voyage à Dakar.",
                Some("https://images.unsplash.com/photo-1534528741775-53994a69daeb?auto=format&fit=crop&w=500&q=80"),
                now_ms.saturating_sub(350_000),
                DeliveryStatus::Read,
            ),
            seed_message(
                "n3",
                SEED_NARA,
                "Je viens de retrouver cette photo !",
                Some("https://images.unsplash.com/photo-1531746020798-e6953c6e8e04?auto=format&fit=crop&w=500&q=80"),
                now_ms.saturating_sub(300_000),
                DeliveryStatus::Delivered,
            ),
        ],
    );

    map.insert(
        SEED_MARC.to_string(),
        vec![seed_message(
            "dm1",
            SEED_MARC,
            "Hey. I've reviewed the database migration plan. We need to optimize the indexing strategy before deployment.",
            None,
            now_ms.saturating_sub(50_000),
            DeliveryStatus::Delivered,
        )],
    );

    map.insert(
        SEED_SARAH.to_string(),
        vec![seed_message(
            "ds1",
            SEED_SARAH,
            "Hi! I just pushed the new UI components. Let me know what you think about the micro-interactions on the button hover states.",
            None,
            now_ms.saturating_sub(150_000),
            DeliveryStatus::Read,
        )],
    );

    map.insert(
        SEED_ALEX.to_string(),
        vec![seed_message(
            "da1",
            SEED_ALEX,
            "Production deployment finished successfully. All systems operational. 🟢",
            None,
            now_ms.saturating_sub(600_000),
            DeliveryStatus::Read,
        )],
    );

    map.insert(
        SEED_SUPPORT.to_string(),
        vec![seed_message(
            "m1",
            SEED_SUPPORT,
            "Hello! How can I help you today?",
            None,
            now_ms.saturating_sub(100_000),
            DeliveryStatus::Read,
        )],
    );

    map.insert(
        SEED_ALICE.to_string(),
        vec![seed_message(
            "m2",
            SEED_ALICE,
            "See you tomorrow!",
            None,
            now_ms.saturating_sub(3_600_000),
            DeliveryStatus::Read,
        )],
    );

    map
}

fn seed_message(
    id: &str,
    contact_id: &str,
    text: &str,
    image_url: Option<&str>,
    timestamp: u64,
    status: DeliveryStatus,
) -> Message {
    Message {
        id: id.to_string(),
        contact_id: contact_id.to_string(),
        sender: SenderRole::Contact,
        text: text.to_string(),
        image_url: image_url.map(str::to_string),
        timestamp,
        status,
    }
}
