use compliance::StubDevice;
use core_speed::{BenchConfig, BenchError, Cipher, Driver, DriverState, OutputFormat, Sampler};
use std::time::Duration;

// MINIMAL profile:
// - sampler byte accounting against a deadline tripped after k calls
// - driver size sequence, abort on failure, key lifecycle
// - both cipher loops run even when the first aborts

const ALL_SIZES: [usize; 9] = [256, 512, 1024, 2048, 4096, 8192, 16384, 32768, 65536];

fn driver_stopping_after(k: u64, device: StubDevice) -> Driver<StubDevice> {
    // long window; the stub trips the token instead
    let config = BenchConfig { duration: Duration::from_secs(120), ..Default::default() };
    let mut d = Driver::new(device, config);
    let token = d.sampler().token();
    d.device_mut().stop_after(k, token);
    d
}

#[test]
fn sampler_total_is_k_times_buffer() {
    for (k, size) in [(1u64, 256usize), (5, 4096), (40, 65536)] {
        let sampler = Sampler::new(Duration::from_secs(120));
        let token = sampler.token();
        let mut calls = 0u64;
        let mut buf = vec![0u8; size];
        let s = sampler
            .sample(&mut buf, |_| {
                calls += 1;
                if calls == k {
                    token.stop();
                }
                Ok(())
            })
            .expect("sample ok");
        assert_eq!(s.total_bytes, k * size as u64);
        assert_eq!(s.operations, k);
    }
}

#[test]
fn sampler_propagates_first_failure() {
    let sampler = Sampler::new(Duration::from_secs(120));
    let mut buf = vec![0u8; 1024];
    let err = sampler
        .sample(&mut buf, |_| {
            Err(core_speed::DeviceError::new(
                "encrypt",
                std::io::Error::new(std::io::ErrorKind::Other, "unplugged"),
            ))
        })
        .unwrap_err();
    assert_eq!(err.partial.total_bytes, 0);
    assert!(err.failed_immediately());
}

#[test]
fn driver_visits_sizes_ascending() {
    let mut d = driver_stopping_after(3, StubDevice::new());
    let results = d.run(Cipher::Null, &mut std::io::sink()).expect("run ok");
    assert_eq!(d.state(), DriverState::Completed);
    assert_eq!(d.device().log.sizes(Cipher::Null), ALL_SIZES.to_vec());
    for (r, size) in results.iter().zip(ALL_SIZES) {
        assert_eq!(r.chunk_size, size);
        assert_eq!(r.sample.total_bytes, 3 * size as u64);
    }
    let log = &d.device().log;
    assert_eq!(log.keys_generated, 9);
    assert_eq!(log.keys_released, 9);
    assert!(log.key_bits.iter().all(|&b| b == 128));
}

#[test]
fn driver_abort_skips_larger_sizes() {
    let mut d = driver_stopping_after(2, StubDevice::new().failing_at(Cipher::Aes128Cbc, 4096));
    let err = d.run(Cipher::Aes128Cbc, &mut std::io::sink()).unwrap_err();
    assert!(matches!(err, BenchError::Operation { chunk_size: 4096, .. }), "{err}");
    assert_eq!(d.state(), DriverState::Aborted(4096));
    let visited = d.device().log.sizes(Cipher::Aes128Cbc);
    assert_eq!(visited, vec![256, 512, 1024, 2048]);
    // key for the failing size is still released
    assert_eq!(d.device().log.keys_generated, 5);
    assert_eq!(d.device().log.keys_released, 5);
}

#[test]
fn second_cipher_runs_after_first_aborts() {
    let mut d = driver_stopping_after(1, StubDevice::new().failing_at(Cipher::Null, 512));
    let mut out = Vec::new();
    let mut outcomes = Vec::new();
    for cipher in Cipher::ALL {
        outcomes.push(d.run(cipher, &mut out).is_ok());
    }
    assert_eq!(outcomes, vec![false, true]);
    assert_eq!(d.device().log.sizes(Cipher::Null), vec![256]);
    assert_eq!(d.device().log.sizes(Cipher::Aes128Cbc), ALL_SIZES.to_vec());
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2 + 9);
    assert_eq!(lines[1], "\tEncrypting in chunks of 512 bytes: failed.");
}

#[test]
fn key_generation_failure_is_fatal_for_the_cipher() {
    let mut d = driver_stopping_after(1, StubDevice::new().failing_keygen());
    let err = d.run(Cipher::Null, &mut std::io::sink()).unwrap_err();
    assert!(matches!(err, BenchError::KeyGeneration { chunk_size: 256, .. }));
    assert!(d.device().log.encrypts.is_empty());
    assert_eq!(d.device().log.key_bits, vec![128]);
}

#[test]
fn json_lines_carry_every_size() {
    let mut d = driver_stopping_after(4, StubDevice::new()).with_format(OutputFormat::Json);
    let mut out = Vec::new();
    d.run(Cipher::Aes128Cbc, &mut out).expect("run ok");
    let text = String::from_utf8(out).unwrap();
    let sizes: Vec<u64> = text
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
        .map(|v| v["chunk_size"].as_u64().unwrap())
        .collect();
    assert_eq!(sizes, ALL_SIZES.iter().map(|&s| s as u64).collect::<Vec<_>>());
}
