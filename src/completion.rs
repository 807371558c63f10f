//! # Shell Completion Module
//!
//! Completion scripts through `clap_complete`, plus enhanced bash and fish
//! scripts that call the hidden `complete-genres` helper so `layout --genre`
//! completes the genre names of the library given on the command line.
//!
//! ```bash
//! musemap completion zsh > ~/.config/zsh/completions/_musemap
//! musemap completion-enhanced bash > ~/.local/share/bash-completion/completions/musemap
//! musemap completion-enhanced fish > ~/.config/fish/completions/musemap.fish
//! ```

use crate::aggregate::{self, AggregationConfig};
use crate::cli::Shell;
use crate::library::{CancelFlag, JsonLibrary, LibrarySource};
use anyhow::{bail, Result};
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io;
use std::path::Path;

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Convert our Shell enum to `clap_complete`'s Shell enum
#[must_use]
pub fn shell_to_completion_shell(shell: &Shell) -> CompletionShell {
    match shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    }
}

const ENHANCED_BASH: &str = r#"#!/bin/bash
# Enhanced musemap completion script with genre name completion
# Install with: musemap completion-enhanced bash > ~/.local/share/bash-completion/completions/musemap

# Library file given to `layout`, skipping option values
_musemap_layout_library() {
    local i seen=0
    for ((i = 1; i < COMP_CWORD; i++)); do
        case ${COMP_WORDS[i]} in
            layout) seen=1 ;;
            --width|--height|--ticks|--genre|--cursor|--config) ((i++)) ;;
            -*) ;;
            *)
                if ((seen)); then
                    printf '%s' "${COMP_WORDS[i]}"
                    return
                fi
                ;;
        esac
    done
}

_musemap() {
    local cur=${COMP_WORDS[COMP_CWORD]}
    local prev=${COMP_WORDS[COMP_CWORD-1]}
    COMPREPLY=()

    if [[ $prev == --genre ]]; then
        local library genre
        library=$(_musemap_layout_library)
        [[ -n $library ]] || return
        while IFS= read -r genre; do
            [[ $genre == "$cur"* ]] && COMPREPLY+=("$(printf '%q' "$genre")")
        done < <(musemap complete-genres "$library" --raw 2>/dev/null)
        return
    fi

    case $prev in
        --config) COMPREPLY=($(compgen -f -- "$cur")); return ;;
        --width|--height|--ticks|--cursor|--top|--artists|--steps|--show) return ;;
    esac

    if ((COMP_CWORD == 1)); then
        COMPREPLY=($(compgen -W "classify analyze layout timeline init-config completion completion-enhanced help" -- "$cur"))
        return
    fi

    case ${COMP_WORDS[1]} in
        completion|completion-enhanced)
            COMPREPLY=($(compgen -W "bash zsh fish power-shell elvish" -- "$cur")) ;;
        layout)
            if [[ $cur == -* ]]; then
                COMPREPLY=($(compgen -W "--width --height --ticks --genre --cursor --config" -- "$cur"))
            else
                COMPREPLY=($(compgen -f -- "$cur"))
            fi
            ;;
        classify|init-config) ;;
        *) COMPREPLY=($(compgen -f -- "$cur")) ;;
    esac
}

complete -F _musemap musemap
"#;

const ENHANCED_FISH: &str = r#"# Enhanced musemap completion script for fish with genre name completion
# Install with: musemap completion-enhanced fish > ~/.config/fish/completions/musemap.fish

# Library file given to `layout`, skipping option values
function __musemap_layout_library
    set -l seen 0
    set -l skip 0
    for token in (commandline -opc)[2..-1]
        if test $skip -eq 1
            set skip 0
            continue
        end
        switch $token
            case layout
                set seen 1
            case --width --height --ticks --genre --cursor --config
                set skip 1
            case '-*'
            case '*'
                if test $seen -eq 1
                    echo $token
                    return
                end
        end
    end
end

function __musemap_complete_genres
    set -l library (__musemap_layout_library)
    if test -n "$library"; and command -sq musemap
        musemap complete-genres $library --raw 2>/dev/null
    end
end

complete -c musemap -e

complete -c musemap -s h -l help -d 'Print help'
complete -c musemap -s V -l version -d 'Print version'
complete -c musemap -l config -r -F -d 'Settings file'

complete -c musemap -f -n '__fish_use_subcommand' -a classify -d 'Classify genre labels into weighted categories'
complete -c musemap -f -n '__fish_use_subcommand' -a analyze -d 'Aggregate a library into the genre hierarchy'
complete -c musemap -f -n '__fish_use_subcommand' -a layout -d 'Settle the force layout and print the final frame'
complete -c musemap -f -n '__fish_use_subcommand' -a timeline -d 'Replay library growth over time'
complete -c musemap -f -n '__fish_use_subcommand' -a init-config -d 'Write the settings file'
complete -c musemap -f -n '__fish_use_subcommand' -a completion -d 'Generate shell completions'
complete -c musemap -f -n '__fish_use_subcommand' -a completion-enhanced -d 'Generate completions with genre names'

complete -c musemap -n '__fish_seen_subcommand_from analyze layout timeline' -F -d 'Library JSON file'
complete -c musemap -f -n '__fish_seen_subcommand_from analyze' -l top -x -d 'Number of genres to keep'
complete -c musemap -f -n '__fish_seen_subcommand_from analyze' -l artists -x -d 'Artists listed per genre'
complete -c musemap -f -n '__fish_seen_subcommand_from analyze classify' -l json -d 'Print JSON'
complete -c musemap -f -n '__fish_seen_subcommand_from layout' -l genre -x -a '(__musemap_complete_genres)' -d 'Drill into this genre'
complete -c musemap -f -n '__fish_seen_subcommand_from layout timeline' -l width -x -d 'Viewport width'
complete -c musemap -f -n '__fish_seen_subcommand_from layout timeline' -l height -x -d 'Viewport height'
complete -c musemap -f -n '__fish_seen_subcommand_from layout' -l ticks -x -d 'Maximum frames to simulate'
complete -c musemap -f -n '__fish_seen_subcommand_from layout' -l cursor -x -d 'Time cursor'
complete -c musemap -f -n '__fish_seen_subcommand_from timeline' -l steps -x -d 'Number of steps'
complete -c musemap -f -n '__fish_seen_subcommand_from timeline' -l show -x -d 'Genres listed per step'
complete -c musemap -f -n '__fish_seen_subcommand_from init-config' -l force -d 'Overwrite an existing file'
complete -c musemap -f -n '__fish_seen_subcommand_from completion completion-enhanced' -a 'bash zsh fish power-shell elvish'
"#;

/// Enhanced completion script for `shell`.
///
/// # Errors
///
/// Only bash and fish have enhanced scripts.
pub fn enhanced_completion(shell: Shell) -> Result<&'static str> {
    match shell {
        Shell::Bash => Ok(ENHANCED_BASH),
        Shell::Fish => Ok(ENHANCED_FISH),
        other => bail!("Enhanced completions are only available for bash and fish, not {other:?}"),
    }
}

/// All genre names of a library, sorted.
///
/// An unreadable library yields no completions rather than an error, since
/// completion scripts must never print errors into the prompt.
#[must_use]
pub fn genre_completions(library: &Path) -> Vec<String> {
    let Ok(library) = JsonLibrary::new(library).load(&CancelFlag::new()) else {
        return Vec::new();
    };
    let config = AggregationConfig { top_n: usize::MAX };
    let mut names: Vec<String> = aggregate::build(&library.tracks, &library.artists, &config)
        .into_iter()
        .map(|g| g.name)
        .collect();
    names.sort();
    names
}

/// Quote a completion for bash-like shells.
fn quote(completion: &str) -> String {
    if completion.contains([' ', '\t', '\n']) {
        format!("\"{}\"", completion.replace('"', "\\\""))
    } else {
        completion.to_string()
    }
}

/// Print genre completions, one per line.
pub fn print_genre_completions(library: &Path, raw: bool) -> Result<()> {
    for name in genre_completions(library) {
        if raw {
            println!("{name}");
        } else {
            println!("{}", quote(&name));
        }
    }
    Ok(())
}
