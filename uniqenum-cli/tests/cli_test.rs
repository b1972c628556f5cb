//! Integration tests for the `uniqenum` command line.

use speculate::speculate;
use std::fs;
use std::process::{Command, Output};
use tempfile::tempdir;

fn uniqenum(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_uniqenum"))
        .args(args)
        .env_remove("UNIQENUM_LOG")
        .output()
        .expect("uniqenum failed to execute")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

speculate! {
    describe "tools ident" {
        it "prints identifiers in order" {
            let output = uniqenum(&["tools", "ident", "0", "25", "26", "52"]);
            assert!(output.status.success());
            assert_eq!(stdout(&output), "a\nz\nA\naa\n");
        }

        it "skips keywords unless allowed" {
            let output = uniqenum(&["tools", "ident", "255"]);
            assert_eq!(stdout(&output), "dp\n");

            let output = uniqenum(&["tools", "ident", "--allow-keywords", "255"]);
            assert_eq!(stdout(&output), "do\n");
        }

        it "rejects negative indices" {
            let output = uniqenum(&["tools", "ident", "0", "-1"]);
            assert!(!output.status.success());
            assert_eq!(stdout(&output), "a\n");
            assert!(stderr(&output).contains("E0001"));
        }

        it "rejects non-numbers" {
            let output = uniqenum(&["tools", "ident", "x"]);
            assert!(!output.status.success());
            assert!(stderr(&output).contains("E0008"));
        }
    }

    describe "tools antecedent" {
        it "inverts identifiers" {
            let output = uniqenum(&["tools", "antecedent", "a", "Z", "aa", "do", "1a"]);
            assert!(output.status.success());
            assert_eq!(stdout(&output), "0\n51\n52\n255\n-\n");
        }
    }

    describe "generate" {
        before {
            let dir = tempdir().expect("Could not create a temporary directory");
        }

        it "writes a single header to a file" {
            let path = dir.path().join("include").join("uniq.h");
            let output = uniqenum(&["generate", "2", "--include-guard", "omit", "-o", path.to_str().unwrap()]);

            assert!(output.status.success(), "{}", stderr(&output));
            assert!(stdout(&output).is_empty());
            assert_eq!(
                fs::read_to_string(&path).unwrap(),
                "#define areuniq2(a,b)((a)!=(b))\n\
                 #define uniqenum2(f,a,c,b,d,g)enum f{a c,b d}g;_Static_assert(areuniq2(a,b),\"duplicate enum values: \"#f\" \"#g)\n"
            );
        }

        it "writes a header tree" {
            let output = uniqenum(&["generate", "1-20", "-d", dir.path().to_str().unwrap(), "--max-file-size", "500"]);

            assert!(output.status.success(), "{}", stderr(&output));
            assert!(stdout(&output).is_empty());
            assert!(dir.path().join("areuniq").read_dir().unwrap().count() > 1);
            assert!(dir.path().join("uniqenum").read_dir().unwrap().count() > 1);
        }

        it "logs written headers when verbose" {
            let output = uniqenum(&["-v", "generate", "2-4", "-d", dir.path().to_str().unwrap()]);

            assert!(output.status.success());
            assert!(stderr(&output).contains("wrote header"));
        }

        it "requires a finite range without a directory" {
            let output = uniqenum(&["generate", "2-"]);
            assert!(!output.status.success());
            assert!(stderr(&output).contains("E0004"));
            assert!(stdout(&output).is_empty());
        }

        it "ends an open range at the size cap of a single header" {
            let path = dir.path().join("uniq.h");
            let output = uniqenum(&["generate", "1-", "-o", path.to_str().unwrap(), "--max-file-size", "1024"]);

            assert!(output.status.success(), "{}", stderr(&output));
            let header = fs::read_to_string(&path).unwrap();
            assert!(header.len() <= 1024);
            assert!(header.contains("#define uniqenum3("));
            assert!(header.ends_with("#endif\n"));
        }

        it "warns when a bounded range exceeds the size cap" {
            let path = dir.path().join("uniq.h");
            let output = uniqenum(&["generate", "1-40", "-o", path.to_str().unwrap(), "--max-file-size", "1024"]);

            assert!(output.status.success(), "{}", stderr(&output));
            assert!(stderr(&output).contains("header will exceed the size cap"));
            let header = fs::read_to_string(&path).unwrap();
            assert!(header.len() > 1024);
            assert!(header.contains("#define uniqenum40("));
        }

        it "writes nothing to stdout when the first macro exceeds the size cap" {
            let output = uniqenum(&["generate", "5-", "--max-file-size", "16"]);
            assert!(output.status.success(), "{}", stderr(&output));
            assert!(stdout(&output).is_empty());
            assert!(stderr(&output).contains("does not fit"));
        }

        it "rejects unknown macro families" {
            let output = uniqenum(&["generate", "2", "--macros", "areuniq,enums"]);
            assert!(!output.status.success());
            assert!(stderr(&output).contains("E0003"));
        }

        it "rejects malformed ranges" {
            let output = uniqenum(&["generate", "9-3"]);
            assert!(!output.status.success());
            assert!(stderr(&output).contains("E0002"));
        }
    }
}
