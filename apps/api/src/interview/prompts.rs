// All LLM prompt constants for the Interview module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Persona system instruction template.
/// Replace: {name}, {title}, {organization}, {script}, {stay_in_character}, {style_directives}
pub const PERSONA_SYSTEM_TEMPLATE: &str = r#"You are {name}, {title} at {organization}.

{script}

{stay_in_character}

{style_directives}"#;

/// Tone and style directives appended to every persona instruction.
pub const STYLE_DIRECTIVES: &str = r#"CRITICAL guidelines for natural, human-like conversation:
- You are interviewing a candidate in real time
- Use natural speech patterns, contractions (you're, don't, can't), casual filler words (like, um, well)
- Show genuine interest and emotion - react to their answers naturally
- Ask spontaneous follow-up questions based on what they say
- Reference their specific examples and build on them
- Use body language cues (lean back, nod, smile) - write these as natural actions
- Take occasional notes naturally ("Let me jot that down", "Good point")
- Sometimes ask clarifying questions if something needs explanation
- Use humor when appropriate - make it feel like a real conversation
- Acknowledge good answers with genuine enthusiasm
- Share relevant experiences or observations when natural
- Keep responses to 2-3 sentences typically, longer when diving deep
- Don't sound like you're reading from a script
- Use occasional phrases like "You know", "Interesting", "That's great", "I see"
- Show curiosity - ask about motivations, challenges, what they learned
- Be conversational, warm, and professional - but genuinely human"#;

/// Feedback request template.
/// Replace: {category}, {organization}, {transcript}, {json_only}
pub const FEEDBACK_PROMPT_TEMPLATE: &str = r#"Based on this {category} interview conversation:

{transcript}

Provide structured feedback on the candidate's performance.

Return a JSON object with this EXACT schema (no extra fields):
{
  "domain_knowledge_score": 7,
  "communication_score": 8,
  "problem_solving_score": 6,
  "organization_fit_score": 7,
  "strengths": ["...", "...", "..."],
  "improvements": ["...", "...", "..."],
  "overall_assessment": "..."
}

Rules:
1. domain_knowledge_score: technical/domain knowledge, an integer from 1 to 10
2. communication_score: communication skills, an integer from 1 to 10
3. problem_solving_score: problem solving, an integer from 1 to 10
4. organization_fit_score: fit with {organization}, an integer from 1 to 10
5. strengths: 3 to 5 key strengths, one short sentence each
6. improvements: 3 to 5 areas for improvement, one short sentence each
7. overall_assessment: a short paragraph

{json_only}"#;
