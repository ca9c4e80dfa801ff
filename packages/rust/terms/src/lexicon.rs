//! Curated lexicon of known game terms.
//!
//! Every entry is on the validator whitelist. Korean display names let the
//! annotator find a term in a translated post that dropped the English gloss.

use std::collections::HashMap;
use std::sync::LazyLock;

use guidepress_shared::TermCategory;
use guidepress_shared::TermCategory::{Ability, Class, Item, Race, Spell};

/// One known term with its Korean display names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexiconEntry {
    pub english: &'static str,
    pub korean: &'static [&'static str],
    pub category: TermCategory,
}

const fn entry(
    english: &'static str,
    korean: &'static [&'static str],
    category: TermCategory,
) -> LexiconEntry {
    LexiconEntry {
        english,
        korean,
        category,
    }
}

static ENTRIES: &[LexiconEntry] = &[
    // Spells
    entry("Magic Missile", &["마법 화살"], Spell),
    entry("Shield", &["방패막"], Spell),
    entry("Healing Word", &["치유의 말", "치유의 단어"], Spell),
    entry("Scorching Ray", &["작열 광선"], Spell),
    entry("Fireball", &["화염구"], Spell),
    entry("Lightning Bolt", &["번개 화살"], Spell),
    entry("Counterspell", &["마법 반사"], Spell),
    entry("Haste", &["가속"], Spell),
    entry("Misty Step", &["안개 걸음"], Spell),
    entry("Thunderwave", &["천둥파"], Spell),
    entry("Burning Hands", &["불타는 손길"], Spell),
    entry("Cure Wounds", &["상처 치료"], Spell),
    entry("Bless", &["축복"], Spell),
    entry("Sanctuary", &["성역"], Spell),
    entry("Eldritch Blast", &["섬뜩한 파동"], Spell),
    entry("Hex", &["주술"], Spell),
    entry("Hunter's Mark", &["사냥꾼의 표식"], Spell),
    entry("Guidance", &["인도"], Spell),
    entry("Resistance", &["저항"], Spell),
    entry("Aid", &["원조"], Spell),
    entry("Spiritual Weapon", &["영적 무기"], Spell),
    entry("Sacred Flame", &["신성한 불꽃"], Spell),
    entry("Spirit Guardians", &["영혼의 수호자"], Spell),
    entry("Mass Healing Word", &["집단 치유의 말"], Spell),
    entry("Death Ward", &["죽음으로부터의 구원"], Spell),
    entry("Storm Sphere", &["폭풍 구체"], Spell),
    entry("Mass Cure Wounds", &["집단 치료"], Spell),
    entry("Heroes Feast", &["영웅들의 연회"], Spell),
    // Class features and other abilities
    entry("Divine Smite", &["신성한 강타"], Ability),
    entry("Divine Strike", &["신성한 일격"], Ability),
    entry("Divine Intervention", &["신의 개입"], Ability),
    entry("Action Surge", &["행동 쇄도"], Ability),
    entry("Sneak Attack", &["암습"], Ability),
    entry("Rage", &["격노"], Ability),
    entry("Wild Shape", &["야생 변신"], Ability),
    entry("Preserve Life", &["생명 보존"], Ability),
    entry("Channel Divinity", &["신성 변환"], Ability),
    entry("War Caster", &["전쟁 시전자"], Ability),
    // Equipment
    entry("Shortsword", &["숏소드"], Item),
    entry("Longbow", &["장궁"], Item),
    entry("Studded Leather", &["징 박힌 가죽 갑옷"], Item),
    entry("Chain Mail", &["사슬 갑옷"], Item),
    entry("Plate Armor", &["판금 갑옷"], Item),
    entry("Adamantine Splint Armor", &["아다만틴 판금갑옷"], Item),
    entry("Amulet of Greater Health", &["상급 건강의 목걸이"], Item),
    entry("Staff of Arcane Blessing", &["비전 축복의 지팡이"], Item),
    entry("Helm of Brilliance", &["광휘의 투구"], Item),
    entry("Boots of Reactionary Defense", &["반응 방어의 장화"], Item),
    entry("Cloak of Protection", &["보호의 망토"], Item),
    entry("Ring of Regeneration", &["재생의 반지"], Item),
    // Races and subraces
    entry("Human", &["인간"], Race),
    entry("Elf", &["엘프"], Race),
    entry("Half-Elf", &["하프엘프"], Race),
    entry("Dwarf", &["드워프"], Race),
    entry("Shield Dwarf", &["방패 드워프"], Race),
    entry("Halfling", &["하플링"], Race),
    entry("Dragonborn", &["드래곤본"], Race),
    entry("Tiefling", &["티플링"], Race),
    entry("Gnome", &["노움"], Race),
    entry("Half-Orc", &["하프오크"], Race),
    entry("Githyanki", &["기스양키"], Race),
    // Classes, subclasses, backgrounds
    entry("Fighter", &["전사", "파이터"], Class),
    entry("Wizard", &["마법사", "위저드"], Class),
    entry("Rogue", &["도적"], Class),
    entry("Cleric", &["클레릭", "성직자"], Class),
    entry("Paladin", &["팔라딘"], Class),
    entry("Barbarian", &["바바리안", "야만용사"], Class),
    entry("Bard", &["음유시인", "바드"], Class),
    entry("Druid", &["드루이드"], Class),
    entry("Monk", &["몽크", "수도승"], Class),
    entry("Sorcerer", &["소서러", "원소술사"], Class),
    entry("Warlock", &["워록", "흑마법사"], Class),
    entry("Ranger", &["레인저", "순찰자"], Class),
    entry("Life Domain", &["생명권역", "생명 권역"], Class),
    entry("Guild Artisan", &["길드 장인"], Class),
];

static BY_ENGLISH: LazyLock<HashMap<String, &'static LexiconEntry>> = LazyLock::new(|| {
    ENTRIES
        .iter()
        .map(|e| (e.english.to_lowercase(), e))
        .collect()
});

static BY_KOREAN: LazyLock<HashMap<&'static str, &'static LexiconEntry>> = LazyLock::new(|| {
    ENTRIES
        .iter()
        .flat_map(|e| e.korean.iter().map(move |k| (*k, e)))
        .collect()
});

/// All lexicon entries in declaration order.
pub fn entries() -> &'static [LexiconEntry] {
    ENTRIES
}

/// Look up an entry by English name (case-insensitive, trimmed).
pub fn lookup(term: &str) -> Option<&'static LexiconEntry> {
    BY_ENGLISH.get(&term.trim().to_lowercase()).copied()
}

/// Look up an entry by one of its Korean display names.
pub fn lookup_korean(alias: &str) -> Option<&'static LexiconEntry> {
    BY_KOREAN.get(alias.trim()).copied()
}

/// Whether the term is a curated known term.
pub fn is_whitelisted(term: &str) -> bool {
    lookup(term).is_some()
}

/// Korean display names for an English term, or an empty slice.
pub fn korean_aliases(term: &str) -> &'static [&'static str] {
    lookup(term).map(|e| e.korean).unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let entry = lookup("  thunderwave ").unwrap();
        assert_eq!(entry.english, "Thunderwave");
        assert_eq!(entry.category, TermCategory::Spell);
    }

    #[test]
    fn korean_alias_maps_back() {
        assert_eq!(lookup_korean("치유의 단어").unwrap().english, "Healing Word");
        assert_eq!(lookup_korean("아다만틴 판금갑옷").unwrap().english, "Adamantine Splint Armor");
        assert!(lookup_korean("없는 용어").is_none());
    }

    #[test]
    fn english_names_are_unique() {
        assert_eq!(BY_ENGLISH.len(), ENTRIES.len());
    }

    #[test]
    fn korean_names_are_unique() {
        let total: usize = ENTRIES.iter().map(|e| e.korean.len()).sum();
        assert_eq!(BY_KOREAN.len(), total);
    }
}
