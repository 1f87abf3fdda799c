use boa_engine::{Context, JsError, Source};

use crate::controllers::embed::{ConsoleLevel, ConsoleSink, ScriptError, ScriptRuntime};

use super::ScriptSettings;

/// Replaces `console` with one that records each call as `[level, text]`.
const CONSOLE_PRELUDE: &str = r#"
const __blockpressConsole = [];
(() => {
    const format = (value) => {
        if (typeof value === "string") return value;
        try {
            const json = JSON.stringify(value);
            return json === undefined ? String(value) : json;
        } catch (_) {
            return String(value);
        }
    };
    const record = (level) => (...args) => {
        __blockpressConsole.push([level, args.map(format).join(" ")]);
    };
    globalThis.console = {
        log: record("log"),
        info: record("info"),
        warn: record("warn"),
        error: record("error"),
        debug: record("log"),
    };
})();
"#;

const CONSOLE_DRAIN: &str = "JSON.stringify(__blockpressConsole)";

/// JavaScript runtime on the boa interpreter.
#[derive(Debug, Clone, Copy)]
pub struct BoaRuntime {
    settings: ScriptSettings,
}

impl BoaRuntime {
    pub fn new(settings: ScriptSettings) -> Self {
        Self { settings }
    }

    fn context(&self) -> Context {
        let mut context = Context::default();
        let limits = context.runtime_limits_mut();
        limits.set_loop_iteration_limit(self.settings.loop_iteration_limit);
        limits.set_recursion_limit(self.settings.recursion_limit);
        context
    }
}

impl Default for BoaRuntime {
    fn default() -> Self {
        Self::new(ScriptSettings::default())
    }
}

impl ScriptRuntime for BoaRuntime {
    fn execute(&self, code: &str, console: &mut dyn ConsoleSink) -> Result<(), ScriptError> {
        let mut context = self.context();
        context
            .eval(Source::from_bytes(CONSOLE_PRELUDE))
            .map_err(|e| script_error(e, &mut context))?;

        let result = context.eval(Source::from_bytes(code));

        // Output written before a failure is still shown
        drain_console(&mut context, console)?;
        result
            .map(|_| ())
            .map_err(|e| script_error(e, &mut context))
    }
}

fn drain_console(context: &mut Context, console: &mut dyn ConsoleSink) -> Result<(), ScriptError> {
    let captured = context
        .eval(Source::from_bytes(CONSOLE_DRAIN))
        .and_then(|value| value.to_string(context))
        .map_err(|e| ScriptError(format!("console output unavailable: {e}")))?
        .to_std_string_escaped();
    let lines: Vec<(String, String)> = serde_json::from_str(&captured)
        .map_err(|e| ScriptError(format!("console output unreadable: {e}")))?;

    for (level, text) in lines {
        console.write(console_level(&level), &text);
    }
    Ok(())
}

fn console_level(name: &str) -> ConsoleLevel {
    match name {
        "info" => ConsoleLevel::Info,
        "warn" => ConsoleLevel::Warn,
        "error" => ConsoleLevel::Error,
        _ => ConsoleLevel::Log,
    }
}

/// The thrown error's message, without its `Error:` prefix.
fn script_error(error: JsError, context: &mut Context) -> ScriptError {
    match error.try_native(context) {
        Ok(native) => ScriptError(native.message().to_string()),
        Err(_) => ScriptError(error.to_string()),
    }
}
