//! Static step schemas for the seven thinking routines.
//!
//! Everything the extractor and the response mapper know about a routine
//! lives in these tables: step keys, human labels, the English and Korean
//! keywords the model uses for each step, extra spellings seen in
//! historical output, and the default prompt shown to students.

use crate::models::enums::{ResponseSlot, RoutineType};

/// One stage of a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDefinition {
    pub key: &'static str,
    pub label: &'static str,
    pub english: &'static str,
    pub korean: &'static str,
    /// Extra label spellings accepted in bold and heading forms only.
    pub aliases: &'static [&'static str],
    pub description: &'static str,
}

/// Ordered steps of one routine. Step keys are unique within a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSchema {
    pub routine: RoutineType,
    pub name: &'static str,
    pub korean_name: &'static str,
    pub steps: &'static [StepDefinition],
}

impl StepSchema {
    pub fn step_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().map(|s| s.key)
    }

    pub fn step(&self, key: &str) -> Option<&'static StepDefinition> {
        self.steps.iter().find(|s| s.key == key)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.key == key)
    }

    /// Positional response slot of a step (first step → `see`, ...).
    pub fn slot_of(&self, key: &str) -> Option<ResponseSlot> {
        self.position(key).and_then(ResponseSlot::at_position)
    }

    /// Step occupying `slot`, if the routine has that many steps.
    pub fn step_at_slot(&self, slot: ResponseSlot) -> Option<&'static StepDefinition> {
        let index = ResponseSlot::all().iter().position(|s| *s == slot)?;
        self.steps.get(index)
    }

    /// Resolve a loosely spelled key ("Non-Examples", "USED_TO_THINK") to the
    /// schema's canonical key.
    pub fn canonical_key(&self, raw: &str) -> Option<&'static str> {
        let folded = fold_key(raw);
        self.steps
            .iter()
            .find(|s| fold_key(s.key) == folded)
            .map(|s| s.key)
    }
}

/// Lowercase and drop `_`, `-` and whitespace so key spellings compare equal.
pub(crate) fn fold_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '_' | '-') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Schema of a routine. Total: every variant has a table.
pub fn schema_for(routine: RoutineType) -> &'static StepSchema {
    match routine {
        RoutineType::SeeThinkWonder => &SEE_THINK_WONDER,
        RoutineType::FourC => &FOUR_C,
        RoutineType::CircleOfViewpoints => &CIRCLE_OF_VIEWPOINTS,
        RoutineType::ConnectExtendChallenge => &CONNECT_EXTEND_CHALLENGE,
        RoutineType::FrayerModel => &FRAYER_MODEL,
        RoutineType::UsedToThinkNowThink => &USED_TO_THINK_NOW_THINK,
        RoutineType::ThinkPuzzleExplore => &THINK_PUZZLE_EXPLORE,
    }
}

/// Schema for a raw routine identifier; unknown identifiers get the
/// See-Think-Wonder schema.
pub fn schema_for_name(raw: &str) -> &'static StepSchema {
    schema_for(RoutineType::resolve(raw))
}

/// Label displayed for a normalized response slot of `routine`.
pub fn slot_label(routine: RoutineType, slot: ResponseSlot) -> Option<&'static str> {
    schema_for(routine).step_at_slot(slot).map(|s| s.label)
}

// ═══════════════════════════════════════════════════════════
// Tables
// ═══════════════════════════════════════════════════════════

static SEE_THINK_WONDER: StepSchema = StepSchema {
    routine: RoutineType::SeeThinkWonder,
    name: "See-Think-Wonder",
    korean_name: "보기-생각하기-궁금하기",
    steps: &[
        StepDefinition {
            key: "see",
            label: "See (본 것)",
            english: "See",
            korean: "본 것",
            aliases: &["보기", "관찰한 것"],
            description: "무엇을 보았나요? 관찰한 것을 자세히 적어보세요.",
        },
        StepDefinition {
            key: "think",
            label: "Think (생각한 것)",
            english: "Think",
            korean: "생각한 것",
            aliases: &["생각하기"],
            description: "본 것을 바탕으로 무엇을 생각했나요?",
        },
        StepDefinition {
            key: "wonder",
            label: "Wonder (궁금한 점)",
            english: "Wonder",
            korean: "궁금한 점",
            aliases: &["궁금하기", "궁금증"],
            description: "무엇이 궁금한가요? 더 알고 싶은 것을 적어보세요.",
        },
    ],
};

static FOUR_C: StepSchema = StepSchema {
    routine: RoutineType::FourC,
    name: "4C",
    korean_name: "4C 사고루틴",
    steps: &[
        StepDefinition {
            key: "connect",
            label: "Connect (연결하기)",
            english: "Connect",
            korean: "연결하기",
            aliases: &["연결"],
            description: "이 내용이 이미 알고 있는 것과 어떻게 연결되나요?",
        },
        StepDefinition {
            key: "challenge",
            label: "Challenge (도전하기)",
            english: "Challenge",
            korean: "도전하기",
            aliases: &["도전", "이의 제기"],
            description: "어떤 생각이나 주장에 의문을 제기하고 싶나요?",
        },
        StepDefinition {
            key: "concepts",
            label: "Concepts (핵심 개념)",
            english: "Concepts",
            korean: "핵심 개념",
            aliases: &["개념"],
            description: "기억해야 할 중요한 개념은 무엇인가요?",
        },
        StepDefinition {
            key: "changes",
            label: "Changes (변화)",
            english: "Changes",
            korean: "변화",
            aliases: &["변화 제안", "변화하기"],
            description: "이 내용이 나의 태도나 행동에 어떤 변화를 제안하나요?",
        },
    ],
};

static CIRCLE_OF_VIEWPOINTS: StepSchema = StepSchema {
    routine: RoutineType::CircleOfViewpoints,
    name: "Circle of Viewpoints",
    korean_name: "관점의 원",
    steps: &[
        StepDefinition {
            key: "viewpoints",
            label: "Viewpoints (관점 탐색)",
            english: "Viewpoints",
            korean: "관점 탐색",
            aliases: &["여러 관점"],
            description: "이 주제와 관련된 다양한 관점을 찾아보세요.",
        },
        StepDefinition {
            key: "perspective",
            label: "Perspective (관점 선택)",
            english: "Perspective",
            korean: "관점 선택",
            aliases: &["선택한 관점"],
            description: "한 관점을 골라 그 입장에서 생각해 보세요.",
        },
        StepDefinition {
            key: "questions",
            label: "Questions (관점별 질문)",
            english: "Questions",
            korean: "관점별 질문",
            aliases: &["질문하기"],
            description: "그 관점에서 떠오르는 질문은 무엇인가요?",
        },
    ],
};

static CONNECT_EXTEND_CHALLENGE: StepSchema = StepSchema {
    routine: RoutineType::ConnectExtendChallenge,
    name: "Connect-Extend-Challenge",
    korean_name: "연결-확장-도전",
    steps: &[
        StepDefinition {
            key: "connect",
            label: "Connect (연결)",
            english: "Connect",
            korean: "연결",
            aliases: &["연결하기"],
            description: "새로운 내용이 이미 알고 있는 것과 어떻게 연결되나요?",
        },
        StepDefinition {
            key: "extend",
            label: "Extend (확장)",
            english: "Extend",
            korean: "확장",
            aliases: &["확장하기"],
            description: "생각이 어떤 방향으로 넓어지거나 깊어졌나요?",
        },
        StepDefinition {
            key: "challenge",
            label: "Challenge (도전)",
            english: "Challenge",
            korean: "도전",
            aliases: &["도전하기"],
            description: "아직 어렵거나 의문이 남는 것은 무엇인가요?",
        },
    ],
};

static FRAYER_MODEL: StepSchema = StepSchema {
    routine: RoutineType::FrayerModel,
    name: "Frayer Model",
    korean_name: "프레이어 모델",
    steps: &[
        StepDefinition {
            key: "definition",
            label: "Definition (정의)",
            english: "Definition",
            korean: "정의",
            aliases: &["정의하기"],
            description: "개념을 자신의 말로 정의해 보세요.",
        },
        StepDefinition {
            key: "characteristics",
            label: "Characteristics (특징)",
            english: "Characteristics",
            korean: "특징",
            aliases: &["특성"],
            description: "개념의 핵심 특징은 무엇인가요?",
        },
        StepDefinition {
            key: "examples",
            label: "Examples (예시)",
            english: "Examples",
            korean: "예시",
            aliases: &["예시들"],
            description: "개념에 해당하는 예시를 들어보세요.",
        },
        StepDefinition {
            key: "non_examples",
            label: "Non-examples (비예시)",
            english: "Non-examples",
            korean: "비예시",
            aliases: &["반례"],
            description: "개념에 해당하지 않는 예시를 들어보세요.",
        },
    ],
};

static USED_TO_THINK_NOW_THINK: StepSchema = StepSchema {
    routine: RoutineType::UsedToThinkNowThink,
    name: "I Used to Think... Now I Think...",
    korean_name: "이전 생각-현재 생각",
    steps: &[
        StepDefinition {
            key: "used_to_think",
            label: "Used to Think (이전 생각)",
            english: "Used to Think",
            korean: "이전 생각",
            aliases: &["I used to think", "예전 생각"],
            description: "이 주제에 대해 예전에는 어떻게 생각했나요?",
        },
        StepDefinition {
            key: "now_think",
            label: "Now Think (현재 생각)",
            english: "Now Think",
            korean: "현재 생각",
            aliases: &["Now I think", "지금 생각"],
            description: "지금은 어떻게 생각하나요? 무엇이 바뀌었나요?",
        },
    ],
};

static THINK_PUZZLE_EXPLORE: StepSchema = StepSchema {
    routine: RoutineType::ThinkPuzzleExplore,
    name: "Think-Puzzle-Explore",
    korean_name: "생각-퍼즐-탐구",
    steps: &[
        StepDefinition {
            key: "think",
            label: "Think (알고 있는 것)",
            english: "Think",
            korean: "알고 있는 것",
            aliases: &["생각하기"],
            description: "이 주제에 대해 이미 알고 있다고 생각하는 것은 무엇인가요?",
        },
        StepDefinition {
            key: "puzzle",
            label: "Puzzle (궁금한 것)",
            english: "Puzzle",
            korean: "궁금한 것",
            aliases: &["퍼즐"],
            description: "어떤 점이 궁금하거나 헷갈리나요?",
        },
        StepDefinition {
            key: "explore",
            label: "Explore (탐구 방법)",
            english: "Explore",
            korean: "탐구 방법",
            aliases: &["탐구하기", "탐구"],
            description: "궁금한 점을 어떻게 탐구해 볼 수 있을까요?",
        },
    ],
};
