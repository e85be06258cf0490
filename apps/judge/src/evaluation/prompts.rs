// Evaluation prompt fragments that are not part of the versioned rubric.

/// User message sent after the rubric. Replace `{instructor_name}` before sending.
pub const JUDGE_USER_PROMPT_TEMPLATE: &str =
    "Please judge the following instructor - {instructor_name} strictly based on the transcript provided.";
