// src/cli/handlers/shell_init.rs

//! `--shell-init`: prints the hook that snapshots a pane's environment after every
//! command, so launched apps inherit it through the run wrapper.
use crate::cli::InitShell;
use crate::constants::PANE_ENV_PREFIX;

pub fn handle(shell: InitShell) {
    print!("{}", hook(shell));
}

/// The hook for `shell`. It only activates inside a tmux pane.
pub fn hook(shell: InitShell) -> String {
    let env_file = format!("{}$TMUX_PANE", PANE_ENV_PREFIX);
    match shell {
        InitShell::Fish => format!(
            r#"# muxdeck: save the environment after each command for launched apps
if set -q TMUX_PANE
    function _muxdeck_save_env --on-event fish_postexec
        env > "{env_file}" 2>/dev/null
    end

    function _muxdeck_cleanup --on-event fish_exit
        rm -f "{env_file}" 2>/dev/null
    end
end
"#
        ),
        InitShell::Zsh => format!(
            r#"# muxdeck: save the environment after each command for launched apps
if [[ -n "$TMUX_PANE" ]]; then
    _muxdeck_save_env() {{
        env > "{env_file}" 2>/dev/null
    }}
    precmd_functions+=(_muxdeck_save_env)

    trap 'rm -f "{env_file}" 2>/dev/null' EXIT
fi
"#
        ),
        InitShell::Bash => format!(
            r#"# muxdeck: save the environment after each command for launched apps
if [[ -n "$TMUX_PANE" ]]; then
    _muxdeck_save_env() {{
        env > "{env_file}" 2>/dev/null
    }}
    PROMPT_COMMAND="_muxdeck_save_env${{PROMPT_COMMAND:+;$PROMPT_COMMAND}}"

    trap 'rm -f "{env_file}" 2>/dev/null' EXIT
fi
"#
        ),
    }
}
