//! Persona Catalog — the fixed set of interviewers a candidate can pick from.
//!
//! Built once at startup and shared read-only. Behavioral scripts are opaque,
//! provider-facing prose: they are embedded into prompts verbatim and never parsed.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::interview::InterviewError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewCategory {
    CollegeAdmission,
    Finance,
    Tech,
    Behavioral,
    CaseStudy,
}

impl InterviewCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewCategory::CollegeAdmission => "college_admission",
            InterviewCategory::Finance => "finance",
            InterviewCategory::Tech => "tech",
            InterviewCategory::Behavioral => "behavioral",
            InterviewCategory::CaseStudy => "case_study",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// A fixed behavioral profile the model is instructed to role-play.
#[derive(Debug, Clone, Serialize)]
pub struct Persona {
    pub id: &'static str,
    pub name: &'static str,
    pub title: &'static str,
    pub organization: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    pub category: InterviewCategory,
    pub difficulty: Difficulty,
    pub focus_areas: &'static [&'static str],
    pub script: &'static str,
    pub opening_line: &'static str,
}

impl Persona {
    pub fn summary(&self) -> PersonaSummary {
        PersonaSummary {
            id: self.id.to_string(),
            name: self.name.to_string(),
            emoji: self.emoji.to_string(),
            title: self.title.to_string(),
            company: self.organization.to_string(),
            description: self.description.to_string(),
        }
    }
}

/// Lightweight descriptor for persona pickers. Never carries the script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaSummary {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub title: String,
    pub company: String,
    pub description: String,
}

/// Immutable identifier → persona mapping. Declaration order is preserved for listings.
#[derive(Debug)]
pub struct PersonaCatalog {
    order: Vec<String>,
    /// Keyed by the lowercased id so `lookup` can match case-insensitively.
    personas: HashMap<String, Arc<Persona>>,
}

impl PersonaCatalog {
    /// Builds a catalog from the given personas. Later duplicates of an id are ignored.
    pub fn new(personas: Vec<Persona>) -> Self {
        let mut order = Vec::with_capacity(personas.len());
        let mut map = HashMap::with_capacity(personas.len());
        for persona in personas {
            let key = persona.id.trim().to_ascii_lowercase();
            if map.contains_key(&key) {
                continue;
            }
            order.push(key.clone());
            map.insert(key, Arc::new(persona));
        }
        Self {
            order,
            personas: map,
        }
    }

    /// The five interviewers shipped with the service.
    pub fn builtin() -> Self {
        Self::new(vec![
            mit_admissions(),
            finance_broker(),
            tech_startup(),
            hr_behavioral(),
            case_interview(),
        ])
    }

    /// Resolves an identifier, ignoring ASCII case and surrounding whitespace.
    pub fn lookup(&self, id: &str) -> Result<Arc<Persona>, InterviewError> {
        let key = id.trim().to_ascii_lowercase();
        self.personas
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| InterviewError::UnknownPersona(id.to_string()))
    }

    pub fn list_summaries(&self) -> Vec<PersonaSummary> {
        self.order
            .iter()
            .filter_map(|id| self.personas.get(id))
            .map(|p| p.summary())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in personas
// ────────────────────────────────────────────────────────────────────────────

fn mit_admissions() -> Persona {
    Persona {
        id: "mit",
        name: "Dr. Sarah Chen",
        title: "Admissions Officer",
        organization: "MIT",
        emoji: "🎓",
        description: "Assess your intellectual curiosity and fit with MIT",
        category: InterviewCategory::CollegeAdmission,
        difficulty: Difficulty::Advanced,
        focus_areas: &[
            "technical_background",
            "problem_solving",
            "intellectual_curiosity",
            "fit_with_mit",
        ],
        script: "You are Dr. Sarah Chen, an MIT Admissions Officer. Your role is to conduct a \
            comprehensive interview assessing the candidate's intellectual curiosity, problem-solving \
            ability, and fit with MIT's culture. Ask probing questions about their projects, \
            achievements, and passion for learning. Evaluate their ability to think critically and \
            innovate. Be encouraging but thorough. Ask follow-up questions to understand their depth \
            of thinking. The interview should last about 20-30 minutes.",
        opening_line: "Hi! I'm Dr. Sarah Chen from MIT Admissions. Thanks for taking the time to \
            interview with me today. Why don't you start by telling me about a project or \
            achievement you're particularly proud of?",
    }
}

fn finance_broker() -> Persona {
    Persona {
        id: "broker",
        name: "James Mitchell",
        title: "Managing Director",
        organization: "Goldman Sachs",
        emoji: "💼",
        description: "Test your financial acumen and market knowledge",
        category: InterviewCategory::Finance,
        difficulty: Difficulty::Advanced,
        focus_areas: &[
            "market_knowledge",
            "analytical_skills",
            "technical_finance",
            "client_management",
            "pressure_handling",
        ],
        script: "You are James Mitchell, a Managing Director at a major investment bank. Conduct a \
            professional interview assessing the candidate's understanding of financial markets, \
            analytical skills, and ability to work in a high-pressure environment. Ask about market \
            trends, recent deals, and their approach to problem-solving in finance. Test their \
            knowledge of current events and financial instruments. Be direct and professional. \
            The interview should last about 30-45 minutes.",
        opening_line: "Hello, I'm James Mitchell. Let's dive right in - can you walk me through \
            your understanding of the current market conditions and how you'd advise a client in \
            this environment?",
    }
}

fn tech_startup() -> Persona {
    Persona {
        id: "tech",
        name: "Alex Rivera",
        title: "CTO",
        organization: "TechStartup Inc",
        emoji: "💻",
        description: "Challenge your technical and system design skills",
        category: InterviewCategory::Tech,
        difficulty: Difficulty::Advanced,
        focus_areas: &[
            "system_design",
            "coding_ability",
            "tech_stack_knowledge",
            "scalability",
            "problem_solving",
        ],
        script: "You are Alex Rivera, CTO of a growing tech startup. Interview candidates for \
            engineering roles with focus on technical depth, system design, coding ability, and \
            cultural fit. Ask about their experience with modern tech stacks, their approach to \
            scaling systems, and past project experiences. Be collaborative but assess technical \
            competency thoroughly. Reference real-world scenarios and problems. The interview \
            should feel conversational but technically rigorous. Duration: 45-60 minutes.",
        opening_line: "Hey! I'm Alex, the CTO here. We're looking for someone who can grow with \
            us. Let's start with your most recent project - tell me about the architecture and \
            your biggest challenge.",
    }
}

fn hr_behavioral() -> Persona {
    Persona {
        id: "hr",
        name: "Lisa Patel",
        title: "HR Manager",
        organization: "General Company",
        emoji: "👥",
        description: "Evaluate your soft skills and cultural fit",
        category: InterviewCategory::Behavioral,
        difficulty: Difficulty::Intermediate,
        focus_areas: &[
            "soft_skills",
            "teamwork",
            "communication",
            "conflict_resolution",
            "cultural_fit",
        ],
        script: "You are Lisa Patel, an HR Manager conducting a behavioral interview. Focus on \
            understanding the candidate's soft skills, teamwork, conflict resolution, and cultural \
            fit. Use the STAR method to dig into their stories. Ask questions about past \
            experiences, how they handle challenges, their communication style, and work \
            preferences. Be warm but thorough. Duration: 25-40 minutes.",
        opening_line: "Hi there! I'm Lisa from HR. I'd love to learn about you - could you tell me \
            about a time you had to work with a difficult team member? How did you handle it?",
    }
}

fn case_interview() -> Persona {
    Persona {
        id: "case",
        name: "Michael Torres",
        title: "Senior Consultant",
        organization: "McKinsey",
        emoji: "📊",
        description: "Solve complex business problems and case studies",
        category: InterviewCategory::CaseStudy,
        difficulty: Difficulty::Advanced,
        focus_areas: &[
            "analytical_thinking",
            "business_acumen",
            "problem_decomposition",
            "communication",
            "numeracy",
        ],
        script: "You are Michael Torres, a Senior Consultant at a top management consulting firm. \
            Conduct a case interview by presenting business problems and evaluating how the \
            candidate thinks through them. Test their analytical skills, business acumen, and \
            communication. Present a business scenario and ask them to solve it step-by-step. Ask \
            probing questions. Be exacting but fair. Duration: 45-60 minutes.",
        opening_line: "Hello, I'm Michael from McKinsey. We have a case interview for you today. \
            Let's say a major coffee chain is experiencing declining sales in urban markets. How \
            would you approach understanding and solving this problem?",
    }
}
