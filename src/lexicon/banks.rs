//! Built-in word and phrase banks.
//!
//! These lists are part of the scoring contract: changing any entry changes
//! scores, so they are versioned together with the TSV tables.

pub const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "nowhere", "cannot",
    "without", "rarely", "seldom", "despite", "aint", "cant", "dont", "didnt", "doesnt", "wasnt",
    "isnt", "wont", "wouldnt", "couldnt", "shouldnt", "arent", "werent", "hasnt", "havent",
    "hadnt",
];

pub const HEDGES: &[&str] = &[
    "maybe",
    "perhaps",
    "might",
    "possibly",
    "probably",
    "i think",
    "i guess",
    "i suppose",
    "kind of",
    "sort of",
    "not sure",
    "not really sure",
    "not entirely sure",
    "seems",
    "seemed",
    "apparently",
    "could be",
    "i feel like",
    "in my opinion",
    "imo",
    "idk",
    "i don't know",
];

pub const CERTAINTY_VERBS: &[&str] = &[
    "believe",
    "know",
    "i'm sure",
    "i am sure",
    "i'm certain",
    "i am certain",
    "guarantee",
    "swear",
    "convinced",
    "no doubt",
    "without a doubt",
];

pub const SUPERLATIVES: &[&str] = &[
    "best",
    "worst",
    "greatest",
    "finest",
    "ultimate",
    "ever",
    "of all time",
    "favorite",
    "favourite",
];

pub const CONTRASTIVES: &[&str] = &["but", "however", "though", "although"];

pub const NEGATED_OPINIONS: &[&str] = &[
    "didn't like",
    "did not like",
    "don't like",
    "do not like",
    "didn't love",
    "didn't enjoy",
    "did not enjoy",
    "wasn't great",
    "was not great",
    "wasn't good",
    "was not good",
    "isn't good",
    "is not good",
    "not a fan",
    "wasn't impressed",
    "not impressed",
    "not that good",
    "not great",
];

pub const TECH_REALITY: &[&str] = &[
    "ai",
    "artificial intelligence",
    "algorithm",
    "algorithms",
    "deepfake",
    "deepfakes",
    "surveillance",
    "social media",
    "smartphone",
    "app",
    "apps",
    "data",
    "hack",
    "hacked",
    "hacker",
    "drone",
    "drones",
    "camera",
    "cameras",
    "facial recognition",
    "virtual reality",
    "vr",
    "chatbot",
    "implant",
    "brain chip",
    "satellite",
    "robot",
    "robots",
    "automation",
    "tracking",
    "rating system",
    "credit score",
    "livestream",
    "video",
    "videos",
    "blackmail",
    "blackmailed",
    "privacy",
    "internet",
    "online",
    "phone",
];

pub const LOGICAL_INFERENCE: &[&str] = &[
    "because",
    "therefore",
    "which means",
    "leads to",
    "as a result",
    "due to",
    "if you",
    "could lead",
    "would lead",
    "it makes sense",
    "in real life",
    "already happening",
    "is already",
    "we already",
    "this is how",
    "based on",
];

pub const FANTASY_FLAGS: &[&str] = &[
    "soul",
    "souls",
    "immortal",
    "immortality",
    "magic",
    "supernatural",
    "ghost",
    "ghosts",
    "demon",
    "demons",
    "time travel",
    "teleport",
    "telepathy",
    "resurrect",
    "resurrected",
    "afterlife",
    "reincarnated",
    "reads your mind",
    "mind reading",
    "after death",
    "witch",
    "curse",
    "spell",
];

pub const REAL_WORLD_ACTORS: &[&str] = &[
    "elon musk",
    "mark zuckerberg",
    "jeff bezos",
    "facebook",
    "google",
    "amazon",
    "apple",
    "tesla",
    "twitter",
    "tiktok",
    "netflix",
    "microsoft",
    "openai",
    "nsa",
    "fbi",
    "cia",
    "government",
    "police",
    "politician",
    "politicians",
    "prime minister",
    "president",
];

pub const SARCASM_MARKERS: &[&str] = &[
    "oh sure",
    "oh great",
    "yeah right",
    "totally",
    "of course",
    "as if",
    "what could possibly go wrong",
    "just what we needed",
    "sure, like",
    "wow, perfect",
];

pub const SOFT_REALISM: &[&str] = &[
    "could happen",
    "might happen",
    "not far off",
    "close to reality",
    "already exists",
    "scary how real",
    "this is real",
    "so realistic",
    "plausible",
    "realistic",
    "near future",
];
