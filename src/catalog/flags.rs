//! Command-line classification for compile and link tasks.

use crate::core::component::Linkage;

/// Flags that take their value as the following argument and must stay paired.
const PAIRED_COMPILE_FLAGS: &[&str] = &["-include", "-imacros", "-x", "-arch", "-isysroot"];

/// Dependency-file flags; they say nothing about the component.
const DEPFILE_FLAGS: &[&str] = &["-MF", "-MT", "-MQ"];

/// What a compile command line says about its target.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CompileArgs {
    pub includes: Vec<String>,
    pub defines: Vec<String>,
    pub flags: Vec<String>,
}

/// Classify compiler arguments (program excluded).
pub fn parse_compile_args(args: &[String]) -> CompileArgs {
    let mut parsed = CompileArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-c" => {}
            "-o" => {
                iter.next();
            }
            "-I" | "-isystem" | "-iquote" => {
                if let Some(value) = iter.next() {
                    parsed.includes.push(value.clone());
                }
            }
            "-D" => {
                if let Some(value) = iter.next() {
                    parsed.defines.push(value.clone());
                }
            }
            flag if DEPFILE_FLAGS.contains(&flag) => {
                iter.next();
            }
            flag if PAIRED_COMPILE_FLAGS.contains(&flag) => match iter.next() {
                Some(value) => parsed.flags.push(format!("{} {}", flag, value)),
                None => parsed.flags.push(flag.to_string()),
            },
            _ if arg.starts_with("-I") => parsed.includes.push(arg[2..].to_string()),
            _ if arg.starts_with("-D") => parsed.defines.push(arg[2..].to_string()),
            _ if arg.starts_with("-o") => {}
            _ if arg.starts_with('-') => parsed.flags.push(arg.clone()),
            _ => {}
        }
    }

    parsed
}

/// What a link command line says about its target.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LinkArgs {
    /// `(linkage, name)` in command-line order
    pub libraries: Vec<(Linkage, String)>,
    /// `(linkage, path)` in command-line order
    pub search_paths: Vec<(Linkage, String)>,
    pub flags: Vec<String>,
}

/// Classify linker arguments (program excluded).
///
/// `-Wl,-Bstatic` and `-Wl,-Bdynamic` switch the bucket for the libraries
/// that follow; the initial bucket is shared.
pub fn parse_link_args(args: &[String]) -> LinkArgs {
    let mut parsed = LinkArgs::default();
    let mut linkage = Linkage::Shared;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-Wl,-Bstatic" | "-Bstatic" => linkage = Linkage::Static,
            "-Wl,-Bdynamic" | "-Bdynamic" => linkage = Linkage::Shared,
            "-o" => {
                iter.next();
            }
            "-L" => {
                if let Some(value) = iter.next() {
                    parsed.search_paths.push((linkage, value.clone()));
                }
            }
            "-l" => {
                if let Some(value) = iter.next() {
                    parsed.libraries.push((linkage, value.clone()));
                }
            }
            _ if arg.starts_with("-L") => parsed.search_paths.push((linkage, arg[2..].to_string())),
            _ if arg.starts_with("-l") => parsed.libraries.push((linkage, arg[2..].to_string())),
            _ if arg.starts_with('-') => parsed.flags.push(arg.clone()),
            _ => {}
        }
    }

    parsed
}

/// Whether a link program is an archiver (`ar`, `llvm-ar`, `arm-none-eabi-ar`).
pub fn is_archiver(program: &str) -> bool {
    let base = program.rsplit(['/', '\\']).next().unwrap_or(program);
    let base = base.strip_suffix(".exe").unwrap_or(base);
    base == "ar" || base.ends_with("-ar") || base == "lib"
}
