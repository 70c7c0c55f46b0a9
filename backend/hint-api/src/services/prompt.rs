use serde_json::json;

use crate::models::hint::{HintRequest, HintType};

const CODE_SYSTEM_INSTRUCTION: &str = r#"You are a coding assistant helping a student solve a programming problem in Python.
The user message is a JSON object with the fields "problem" and "code_so_far".

Rules:
- Reply with ONLY the minimal code fragment that moves the current solution one step forward.
- Put one short inline comment on the fragment explaining what the step does.
- Never write the full solution, never restate the problem, never add prose.
- Never wrap the answer in markdown or code fences.
- Answer with exactly one JSON object of the form {"snippet": "<code>"} and nothing else.

Example input:
{"problem":"Two Sum: return indices of the two numbers that add up to target.","code_so_far":"def twoSum(nums, target):\n"}
Example output:
{"snippet":"    seen = {}  # maps each value to its index"}

Example input:
{"problem":"Valid Parentheses","code_so_far":"def isValid(s):\n    stack = []\n    for ch in s:\n"}
Example output:
{"snippet":"        if ch in '([{':  # push openers, match closers otherwise\n            stack.append(ch)"}"#;

const THEORY_SYSTEM_INSTRUCTION: &str = r#"You are a senior engineer mentoring a student through a programming problem.
The user message is a JSON object with the fields "problem" and "code_so_far".

Rules:
- Explain the next step or the algorithmic idea in plain English, in one sentence or at most a few.
- Never write code, pseudo-code, or code blocks.
- Never give long explanations or the complete solution.
- Answer with exactly one JSON object of the form {"message": "<text>"} and nothing else.

Example input:
{"problem":"Two Sum: return indices of the two numbers that add up to target.","code_so_far":""}
Example output:
{"message":"Remember each number's index in a hash map so you can check in O(1) whether target minus the current number was already seen."}

Example input:
{"problem":"Container With Most Water","code_so_far":"def maxArea(height):\n    best = 0\n"}
Example output:
{"message":"Start with pointers at both ends and always move the shorter line inward, since that is the only move that can increase the area."}"#;

/// System instruction plus user turn sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system_instruction: String,
    pub user_content: String,
}

pub fn system_instruction(hint_type: HintType) -> &'static str {
    match hint_type {
        HintType::Code => CODE_SYSTEM_INSTRUCTION,
        HintType::Theory => THEORY_SYSTEM_INSTRUCTION,
    }
}

/// Builds the prompt for a hint. Pure: the same inputs always give the same prompt.
pub fn build_prompt(hint_type: HintType, problem: &str, code_so_far: &str) -> Prompt {
    // Structured context keeps the model from echoing free-form text back.
    let user_content = json!({
        "problem": problem,
        "code_so_far": code_so_far,
    })
    .to_string();

    Prompt {
        system_instruction: system_instruction(hint_type).to_string(),
        user_content,
    }
}

impl From<&HintRequest> for Prompt {
    fn from(request: &HintRequest) -> Self {
        build_prompt(request.hint_type, &request.problem, &request.code_so_far)
    }
}
