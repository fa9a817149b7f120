use std::collections::HashMap;

pub const INPUT_VARIABLE: &str = "INPUT";

#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    variables: HashMap<String, String>,
    result: String,
}

impl ExecutionContext {
    pub fn new(input: impl Into<String>) -> Self {
        let input = input.into();
        let mut context = Self {
            variables: HashMap::new(),
            result: input.clone(),
        };
        context.set(INPUT_VARIABLE, input);
        context
    }

    fn key(name: &str) -> String {
        name.trim().to_ascii_lowercase()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(&Self::key(name)).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.variables.insert(Self::key(name), value.into());
    }

    pub fn input(&self) -> &str {
        self.get(INPUT_VARIABLE).unwrap_or_default()
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn set_result(&mut self, value: impl Into<String>) {
        self.result = value.into();
    }
}
