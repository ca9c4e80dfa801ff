//! Combat routine section for guides that lack one.
//!
//! Spells are read from `**name**: description` items in the post and
//! sorted into buff, attack, and utility steps by keywords in their
//! descriptions. Posts with fewer than three such items get a generic
//! routine instead.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

/// Heading of the appended section.
pub const ROUTINE_HEADING: &str = "## 전투 루틴 예시";

/// Fewest spells needed for a routine built from the post.
const MIN_SPELLS: usize = 3;

const BUFF_KEYWORDS: &[&str] = &[
    "버프", "강화", "증가", "보너스", "이점", "방어", "보호", "치유", "회복",
];

const ATTACK_KEYWORDS: &[&str] = &["피해", "공격", "데미지", "타격", "대미지"];

const GENERIC_ROUTINE: &str = "1. 전투 시작 → 버프 주문 선사용\n\
2. 주요 공격 주문 사용 → 보조 주문으로 연계\n\
3. 대상 상태에 따라 CC/서포트 주문 적절히 활용";

static COMBAT_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^#+[ \t]+(?:전투|컴뱃|콤보|루틴|combat|routine)").expect("valid regex")
});

static SPELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)\*\*([^*(\n]+?)[ \t]*(?:\([^)\n]*\))?\*\*[ \t]*(?:\([^)\n]*\))?[ \t]*[:：][ \t]*(.+?)(?:[.。]|$)",
    )
    .expect("valid regex")
});

static IMG_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<img\b[^>]*>").expect("valid regex"));

/// A spell or skill listed in the post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spell {
    pub name: String,
    pub description: String,
}

/// Where a spell goes in the routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Buff,
    Attack,
    Utility,
}

impl Step {
    /// Classify by description keywords. Buff keywords win over attack ones.
    pub fn of(description: &str) -> Self {
        let description = description.to_lowercase();
        if BUFF_KEYWORDS.iter().any(|k| description.contains(k)) {
            Step::Buff
        } else if ATTACK_KEYWORDS.iter().any(|k| description.contains(k)) {
            Step::Attack
        } else {
            Step::Utility
        }
    }
}

/// Whether the post already has a combat, combo, or routine heading.
pub fn has_combat_section(md: &str) -> bool {
    COMBAT_HEADING_RE.is_match(md)
}

/// `**name**: description` items in document order, deduplicated by name
/// (case-insensitive). A `(English)` gloss is dropped from the name, and
/// inline image tags are ignored.
pub fn extract_spells(md: &str) -> Vec<Spell> {
    let text = IMG_TAG_RE.replace_all(md, "");
    let mut seen = std::collections::HashSet::new();
    let mut spells = Vec::new();

    for caps in SPELL_RE.captures_iter(&text) {
        let name = caps[1].trim();
        let description = caps[2].trim();
        if name.chars().count() < 2 || !seen.insert(name.to_lowercase()) {
            continue;
        }
        spells.push(Spell {
            name: name.to_string(),
            description: description.to_string(),
        });
    }

    debug!(spells = spells.len(), "spells extracted");
    spells
}

/// The routine section for a list of spells, heading included.
pub fn combat_routine(spells: &[Spell]) -> String {
    if spells.len() < MIN_SPELLS {
        return format!("{ROUTINE_HEADING}\n{GENERIC_ROUTINE}");
    }

    let mut buff: Vec<&str> = Vec::new();
    let mut attack: Vec<&str> = Vec::new();
    let mut utility: Vec<&str> = Vec::new();
    for spell in spells {
        match Step::of(&spell.description) {
            Step::Buff => buff.push(&spell.name),
            Step::Attack => attack.push(&spell.name),
            Step::Utility => utility.push(&spell.name),
        }
    }

    // An empty step takes the spell at its own position.
    for (slot, spell) in [&mut buff, &mut attack, &mut utility].into_iter().zip(spells) {
        if slot.is_empty() {
            slot.push(&spell.name);
        }
    }

    let mut prepare = format!("1. **전투 준비** → {}", buff[0]);
    if let Some(second) = buff.get(1) {
        prepare.push_str(&format!(" + {second}"));
    }
    let mut strike = format!("2. **공격 페이즈** → {}", attack[0]);
    if let Some(second) = attack.get(1) {
        strike.push_str(&format!(" → {second} 연계"));
    }
    let mut respond = format!("3. **대응 페이즈** → 상황에 따라 {}", utility[0]);
    if let Some(second) = utility.get(1) {
        respond.push_str(&format!(" 또는 {second}"));
    }
    respond.push_str(" 사용");

    format!(
        "{ROUTINE_HEADING}\n{prepare}\n{strike}\n{respond}\n4. **위기 상황** → 보유한 포션 및 스크롤 적극 활용"
    )
}

/// Append a combat routine section unless the post already has one.
pub fn insert_combat_routine(md: &str) -> String {
    if has_combat_section(md) {
        debug!("combat section already present");
        return md.to_string();
    }
    let spells = extract_spells(md);
    info!(spells = spells.len(), "combat routine added");
    format!("{}\n\n{}\n", md.trim_end(), combat_routine(&spells))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
