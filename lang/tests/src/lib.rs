pub mod utils {
    use std::path::PathBuf;
    use tagless_driver::{Artifact, Conf, Driver, DriverError};

    pub fn stg_path(file: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("stg").join(format!("{file}.stg"))
    }

    fn driver() -> Driver {
        Driver::with_conf(Conf::default())
    }

    pub fn compile(file: &str) -> Artifact {
        let (name, source) = Driver::read(stg_path(file)).unwrap();
        match driver().compile(&name, &source) {
            | Ok(artifact) => artifact,
            | Err(err) => {
                eprintln!("{}", err);
                panic!("Error compiling {file}");
            }
        }
    }

    pub fn reject(file: &str) -> DriverError {
        let (name, source) = Driver::read(stg_path(file)).unwrap();
        match driver().compile(&name, &source) {
            | Ok(_) => panic!("{file} compiled but should have been rejected"),
            | Err(err) => err,
        }
    }
}

/// A program under `stg/` compiles, and its C output mentions every symbol given.
#[macro_export]
macro_rules! compile_stg {
    ($name:ident, $file:expr $(, $symbol:expr)* $(,)?) => {
        #[test]
        fn $name() {
            let artifact = ::tagless_tests::utils::compile($file);
            $(
                assert!(
                    artifact.c_source.contains($symbol),
                    "`{}` not found in the output of {}",
                    $symbol,
                    $file
                );
            )*
        }
    };
}

/// A program under `stg/` is rejected with an error whose message contains `$needle`.
#[macro_export]
macro_rules! reject_stg {
    ($name:ident, $file:expr, $needle:expr) => {
        #[test]
        fn $name() {
            let err = ::tagless_tests::utils::reject($file).to_string();
            assert!(err.contains($needle), "unexpected error for {}: {}", $file, err);
        }
    };
}
