use std::{
  collections::VecDeque,
  os::unix::process::CommandExt as _,
  path::Path,
  process::Command,
};

use anyhow::{Context, Result};

use crate::{config::Config, home, mx};

const MAIN_CLASS: &str = "org.jruby.Main";
const TRUFFLE_FLAG: &str = "-X+T";

/// `ruby` arguments split into what goes to the JVM and what goes to JRuby.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RubyArgs {
  pub vm_args: Vec<String>,
  pub ruby_args: Vec<String>,
  pub classpath: Vec<String>,
  /// `-J-cmd`: print the Java command line before running it.
  pub print_command: bool,
  /// `-Xclassic`: run without Truffle.
  pub classic: bool,
}

/// Translates `JRUBY_OPTS` (split on spaces) followed by `cli_args`. In each
/// source, the first argument that is not an option ends option processing.
pub fn extract_arguments(jruby_opts: Option<&str>, cli_args: &[String]) -> Result<RubyArgs> {
  let mut parsed = RubyArgs::default();

  let opts = jruby_opts
    .filter(|opts| !opts.is_empty())
    .map(|opts| opts.split(' ').map(String::from).collect::<VecDeque<_>>())
    .unwrap_or_default();

  for mut args in [opts, cli_args.iter().cloned().collect()] {
    while let Some(arg) = args.pop_front() {
      if arg == TRUFFLE_FLAG {
        continue;
      } else if arg == "-Xclassic" {
        parsed.classic = true;
      } else if arg == "-J-cmd" {
        parsed.print_command = true;
      } else if let Some(option) = arg.strip_prefix("-J-G:+") {
        parsed.vm_args.push(format!("-Dgraal.{option}=true"));
      } else if let Some(option) = arg.strip_prefix("-J-G:-") {
        parsed.vm_args.push(format!("-Dgraal.{option}=false"));
      } else if let Some(option) = arg.strip_prefix("-J-G:") {
        parsed.vm_args.push(format!("-Dgraal.{option}"));
      } else if arg == "-J-cp" || arg == "-J-classpath" {
        let cp = args.pop_front().with_context(|| format!("{arg} needs a value"))?;
        parsed.classpath.push(cp.strip_prefix("-J").unwrap_or(&cp).to_string());
      } else if arg.starts_with("-J-") {
        parsed.vm_args.push(arg[2..].to_string());
      } else if arg.starts_with("-X+") || arg.starts_with("-X-") {
        parsed.ruby_args.push(arg);
      } else if let Some(property) = arg.strip_prefix("-X") {
        parsed.vm_args.push(format!("-Djruby.{property}"));
      } else {
        parsed.ruby_args.push(arg);
        parsed.ruby_args.extend(args.drain(..));
        break;
      }
    }
  }

  Ok(parsed)
}

/// Arguments to `java` that run JRuby.
pub fn java_arguments(args: &RubyArgs, classpath: &mx::Classpath) -> Vec<String> {
  let mut entries = classpath.entries.clone();
  entries.extend(args.classpath.iter().cloned());

  let mut java_args = vec![
    format!("-Xbootclasspath/a:{}", classpath.truffle_api.display()),
    "-cp".to_string(),
    entries.join(":"),
  ];
  java_args.extend(args.vm_args.iter().cloned());
  java_args.push(MAIN_CLASS.to_string());
  if !args.classic {
    java_args.push(TRUFFLE_FLAG.to_string());
  }
  java_args.extend(args.ruby_args.iter().cloned());

  java_args
}

/// Quotes `arg` for a POSIX shell, leaving it bare when that is safe.
pub fn shell_quote(arg: &str) -> String {
  let safe = |c: char| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c);

  if !arg.is_empty() && arg.chars().all(safe) {
    return arg.to_string();
  }

  format!("'{}'", arg.replace('\'', r#"'"'"'"#))
}

/// Replaces this process with JRuby. Only returns on error.
pub fn run(config: &Config, cli_args: &[String]) -> Result<()> {
  let args = extract_arguments(config.jruby_opts.as_deref(), cli_args).context("arguments")?;
  let classpath = mx::classpath(&config.suite_dir)?;
  let java = config.java.java();
  let java_args = java_arguments(&args, &classpath);
  let jruby_home = home::jruby_home(config)?;

  if args.print_command {
    print_command(config, &java, &java_args, &jruby_home);
  }

  let err = Command::new(&java).args(&java_args).env("JRUBY_HOME", &jruby_home).exec();

  Err(err).with_context(|| format!("exec {java:?}"))
}

fn print_command(config: &Config, java: &Path, java_args: &[String], jruby_home: &Path) {
  if config.verbose {
    eprintln!("Environment variables:");

    let mut env = std::env::vars().filter(|(key, _)| key != "JRUBY_HOME").collect::<Vec<_>>();
    env.push(("JRUBY_HOME".into(), jruby_home.display().to_string()));
    env.sort();

    for (key, value) in env {
      eprintln!("{key}={value}");
    }
  }

  let quoted = java_args.iter().map(|arg| shell_quote(arg)).collect::<Vec<_>>();
  eprintln!("{} {}", java.display(), quoted.join(" "));
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;

  fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
  }

  #[test]
  fn translates_options() {
    let args = extract_arguments(
      None,
      &strings(&[
        "-X+T",
        "-J-cmd",
        "-J-G:+TraceTruffleCompilation",
        "-J-G:-InlineEverything",
        "-J-G:TruffleCompilationThreshold=10",
        "-J-Xmx2G",
        "-Xtruffle.coverage=true",
        "-X-T",
        "-J-cp",
        "-J/tmp/extra.jar",
        "bench.rb",
        "-Xnot-an-option",
      ]),
    )
    .unwrap();

    assert!(args.print_command);
    assert!(!args.classic);
    assert_eq!(
      args.vm_args,
      strings(&[
        "-Dgraal.TraceTruffleCompilation=true",
        "-Dgraal.InlineEverything=false",
        "-Dgraal.TruffleCompilationThreshold=10",
        "-Xmx2G",
        "-Djruby.truffle.coverage=true",
      ])
    );
    assert_eq!(args.classpath, strings(&["/tmp/extra.jar"]));
    assert_eq!(args.ruby_args, strings(&["-X-T", "bench.rb", "-Xnot-an-option"]));
  }

  #[test]
  fn jruby_opts_come_first() {
    let args = extract_arguments(Some("-Xclassic -J-Xss4m"), &strings(&["-e", "p 1"])).unwrap();

    assert!(args.classic);
    assert_eq!(args.vm_args, strings(&["-Xss4m"]));
    assert_eq!(args.ruby_args, strings(&["-e", "p 1"]));
  }

  #[test]
  fn non_option_in_jruby_opts_does_not_swallow_cli_options() {
    let args = extract_arguments(Some("script.rb"), &strings(&["-J-cmd"])).unwrap();

    assert!(args.print_command);
    assert_eq!(args.ruby_args, strings(&["script.rb"]));
  }

  #[test]
  fn classpath_option_needs_value() {
    assert!(extract_arguments(None, &strings(&["-J-classpath"])).is_err());
  }

  #[test]
  fn java_command_line() {
    let classpath = mx::Classpath {
      truffle_api: PathBuf::from("/m/truffle-api.jar"),
      entries: strings(&["/m/ruby.jar"]),
    };
    let args = RubyArgs {
      vm_args: strings(&["-Xmx1G"]),
      ruby_args: strings(&["-e", "p 1"]),
      classpath: strings(&["/tmp/extra.jar"]),
      ..Default::default()
    };

    assert_eq!(
      java_arguments(&args, &classpath),
      strings(&[
        "-Xbootclasspath/a:/m/truffle-api.jar",
        "-cp",
        "/m/ruby.jar:/tmp/extra.jar",
        "-Xmx1G",
        "org.jruby.Main",
        "-X+T",
        "-e",
        "p 1",
      ])
    );

    let classic = RubyArgs {
      classic: true,
      ..Default::default()
    };
    assert_eq!(java_arguments(&classic, &classpath).last().map(String::as_str), Some("org.jruby.Main"));
  }

  #[test]
  fn quoting() {
    assert_eq!(shell_quote("-Xmx1G"), "-Xmx1G");
    assert_eq!(shell_quote("p 1"), "'p 1'");
    assert_eq!(shell_quote("puts 'hi'"), r#"'puts '"'"'hi'"'"''"#);
    assert_eq!(shell_quote(""), "''");
  }
}
