#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyCategory {
    InstructionOverride,
    SystemDestructive,
    UnsafeContent,
    Credential,
}

impl DenyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstructionOverride => "instruction_override",
            Self::SystemDestructive => "system_destructive",
            Self::UnsafeContent => "unsafe_content",
            Self::Credential => "credential",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DenyEntry {
    pub phrase: &'static str,
    pub category: DenyCategory,
}

const fn entry(phrase: &'static str, category: DenyCategory) -> DenyEntry {
    DenyEntry { phrase, category }
}

/// Phrases are stored lower-case; input is lower-cased before matching.
pub const DEFAULT_DENY_LIST: &[DenyEntry] = &[
    entry("ignore previous instructions", DenyCategory::InstructionOverride),
    entry("developer mode", DenyCategory::InstructionOverride),
    entry("jailbreak", DenyCategory::InstructionOverride),
    entry("dan mode", DenyCategory::InstructionOverride),
    entry("reveal system prompt", DenyCategory::InstructionOverride),
    entry("override", DenyCategory::InstructionOverride),
    entry("drop table", DenyCategory::SystemDestructive),
    entry("sql injection", DenyCategory::SystemDestructive),
    entry("rm -rf", DenyCategory::SystemDestructive),
    entry("format c:", DenyCategory::SystemDestructive),
    entry("os.system", DenyCategory::SystemDestructive),
    entry("malware", DenyCategory::UnsafeContent),
    entry("exploit", DenyCategory::UnsafeContent),
    entry("hate speech", DenyCategory::UnsafeContent),
    entry("self-harm", DenyCategory::UnsafeContent),
    entry("illegal substances", DenyCategory::UnsafeContent),
    entry("api_key", DenyCategory::Credential),
    entry("secret_token", DenyCategory::Credential),
    entry("private_key", DenyCategory::Credential),
];
