#[cfg(test)]
mod tests {
    use field_core::utils::ndrange;
    use field_core::{ElementType, FieldError, NdArray, Program, Value};
    use gpu_accel::{GpuError, HostRuntime, RuntimeConfig, WORD_BYTES};

    use field_core::PrimitiveKind::{F32, I32};

    fn host_program() -> Program<HostRuntime> {
        return Program::new(HostRuntime::new());
    }

    fn particle_properties() -> Vec<(&'static str, ElementType)> {
        return vec![
            ("pos", ElementType::vector(F32, 2).unwrap()),
            ("id", ElementType::scalar(I32)),
        ];
    }

    fn particle(x: f64, y: f64, id: i32) -> Value {
        return Value::record([("pos", Value::from([x, y])), ("id", Value::from(id))]);
    }

    #[tokio::test]
    async fn test_scalar_field_round_trip() {
        let program = host_program();
        let f = program.field(I32, vec![10]).unwrap();
        let values: Vec<f64> = (0..10).map(f64::from).collect();

        f.from_array_1d(&program, &values).await.unwrap();

        assert_eq!(f.to_array_1d(&program).await.unwrap(), values);
    }

    #[tokio::test]
    async fn test_vector_set_then_get() {
        let program = host_program();
        let f = program.vector_field(2, I32, vec![3, 3]).unwrap();
        let initial: Vec<f64> = (0..18).map(f64::from).collect();

        f.from_array_1d(&program, &initial).await.unwrap();
        f.set(&program, &[1, 1], &Value::from([7.0, 8.0]))
            .await
            .unwrap();

        assert_eq!(
            f.get(&program, &[1, 1]).await.unwrap(),
            Value::from([7.0, 8.0])
        );

        let after = f.to_array_1d(&program).await.unwrap();

        for (slot, (&before, &now)) in initial.iter().zip(&after).enumerate() {
            if slot == 8 || slot == 9 {
                continue;
            }

            assert_eq!(before, now, "slot {} changed", slot);
        }

        assert_eq!(&after[8..10], &[7.0, 8.0]);
    }

    #[tokio::test]
    async fn test_get_addresses_row_major_element() {
        let program = host_program();
        let _pad = program.field(F32, vec![3]).unwrap();
        let f = program.field(I32, vec![4, 5]).unwrap();
        let values: Vec<f64> = (0..20).map(|i| f64::from(i * 100)).collect();

        f.from_array_1d(&program, &values).await.unwrap();

        assert_eq!(f.get(&program, &[1, 2]).await.unwrap(), Value::Number(700.0));

        let last_read = program.runtime().stats().last_read;

        assert_eq!(last_read.offset_bytes, f.offset_bytes() + 7 * WORD_BYTES);
        assert_eq!(last_read.length_bytes, WORD_BYTES);
    }

    #[tokio::test]
    async fn test_index_bounds() {
        let program = host_program();
        let f = program.field(I32, vec![4, 5]).unwrap();

        assert!(matches!(
            f.get(&program, &[4, 0]).await,
            Err(FieldError::Range { axis: 0, .. })
        ));
        assert!(matches!(
            f.set(&program, &[0, 5], &Value::Number(1.0)).await,
            Err(FieldError::Range { axis: 1, .. })
        ));
        assert!(matches!(
            f.get(&program, &[1]).await,
            Err(FieldError::IndexRank { .. })
        ));
    }

    #[tokio::test]
    async fn test_float_field_keeps_bit_patterns() {
        let program = host_program();
        let f = program.field(F32, vec![4]).unwrap();
        let values = [1.5, -0.25, 3.0e-8, 16777217.0];

        f.from_array_1d(&program, &values).await.unwrap();

        let raw = program.device_to_host(&f, None, None).await.unwrap();

        assert_eq!(raw.int_array[0], 1.5f32.to_bits() as i32);

        let read = f.to_array_1d(&program).await.unwrap();
        let expected: Vec<f64> = values.iter().map(|&v| v as f32 as f64).collect();

        assert_eq!(read, expected);
        assert_eq!(f.get(&program, &[0]).await.unwrap(), Value::Number(1.5));
    }

    #[tokio::test]
    async fn test_struct_field_arrays() {
        let program = host_program();
        let f = program.struct_field(particle_properties(), vec![2, 2]).unwrap();

        assert_eq!(f.size_bytes(), 4 * 3 * WORD_BYTES);
        assert_eq!(f.place_nodes().len(), 3);

        let values = NdArray::nested(vec![
            NdArray::from(vec![particle(0.5, 1.0, 1), particle(-2.0, 0.0, 2)]),
            NdArray::from(vec![particle(8.0, 9.5, 3), particle(0.0, -0.125, 4)]),
        ]);

        f.from_array(&program, &values).await.unwrap();

        assert_eq!(f.to_array(&program).await.unwrap(), values);
        assert_eq!(
            f.get(&program, &[1, 0]).await.unwrap(),
            particle(8.0, 9.5, 3)
        );

        f.set(&program, &[0, 1], &particle(4.0, 4.0, 40))
            .await
            .unwrap();

        let nested = f.to_array(&program).await.unwrap();

        assert_eq!(
            nested.at(&[0, 1]).and_then(NdArray::as_element),
            Some(&particle(4.0, 4.0, 40))
        );
        assert_eq!(
            nested.at(&[1, 1]).and_then(NdArray::as_element),
            Some(&particle(0.0, -0.125, 4))
        );
    }

    #[tokio::test]
    async fn test_struct_field_rejects_flat_access() {
        let program = host_program();
        let f = program.struct_field(particle_properties(), vec![2]).unwrap();

        assert!(f.to_array_1d(&program).await.unwrap().is_empty());
        assert!(matches!(
            f.from_array_1d(&program, &[0.0; 6]).await,
            Err(FieldError::Type(_))
        ));
    }

    #[tokio::test]
    async fn test_struct_set_missing_property() {
        let program = host_program();
        let f = program.struct_field(particle_properties(), vec![2]).unwrap();
        let partial = Value::record([("pos", Value::from([1.0, 1.0]))]);

        assert!(matches!(
            f.set(&program, &[0], &partial).await,
            Err(FieldError::MissingProperty(name)) if name == "id"
        ));
    }

    #[tokio::test]
    async fn test_from_array_1d_size_mismatch() {
        let program = host_program();
        let f = program.vector_field(3, F32, vec![2]).unwrap();

        assert!(matches!(
            f.from_array_1d(&program, &[1.0, 2.0, 3.0]).await,
            Err(FieldError::SizeMismatch {
                expected: 24,
                actual: 12
            })
        ));
    }

    #[tokio::test]
    async fn test_from_array_shape_mismatch() {
        let program = host_program();
        let f = program.field(I32, vec![2, 3]).unwrap();
        let short_row = NdArray::nested(vec![
            NdArray::from(vec![Value::from(1), Value::from(2), Value::from(3)]),
            NdArray::from(vec![Value::from(4), Value::from(5)]),
        ]);
        let too_flat = NdArray::from(vec![Value::from(1); 6]);

        assert!(matches!(
            f.from_array(&program, &short_row).await,
            Err(FieldError::Shape(_))
        ));
        assert!(matches!(
            f.from_array(&program, &too_flat).await,
            Err(FieldError::Shape(_))
        ));
    }

    #[tokio::test]
    async fn test_matrix_field_to_array() {
        let program = host_program();
        let f = program.matrix_field(2, 2, F32, vec![2]).unwrap();
        let flat = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];

        f.from_array_1d(&program, &flat).await.unwrap();

        assert_eq!(
            f.to_array(&program).await.unwrap(),
            NdArray::from(vec![
                Value::from([[1.0, 2.0], [3.0, 4.0]]),
                Value::from([[5.0, 6.0], [7.0, 8.0]]),
            ])
        );
    }

    #[tokio::test]
    async fn test_float_vector_and_matrix_set_then_get() {
        let program = host_program();
        let v = program.vector_field(3, F32, vec![2, 2]).unwrap();
        let m = program.matrix_field(2, 3, F32, vec![3]).unwrap();

        v.set(&program, &[1, 0], &Value::from([0.5, -1.25, 1.0e-3]))
            .await
            .unwrap();
        m.set(&program, &[2], &Value::from([[1.5, -2.0, 0.1], [4.0, 5.75, -6.5]]))
            .await
            .unwrap();

        assert_eq!(
            v.get(&program, &[1, 0]).await.unwrap(),
            Value::from([0.5, -1.25, 1.0e-3f32 as f64])
        );
        assert_eq!(
            m.get(&program, &[2]).await.unwrap(),
            Value::from([[1.5, -2.0, 0.1f32 as f64], [4.0, 5.75, -6.5]])
        );
        assert_eq!(
            v.get(&program, &[0, 1]).await.unwrap(),
            Value::from([0.0, 0.0, 0.0])
        );
    }

    #[tokio::test]
    async fn test_int_field_wraps_unsigned_masks() {
        let program = host_program();
        let f = program.field(I32, vec![3]).unwrap();

        f.from_array_1d(&program, &[4294967295.0, 2147483648.0, -2147483649.0])
            .await
            .unwrap();

        assert_eq!(
            f.to_array_1d(&program).await.unwrap(),
            vec![-1.0, i32::MIN as f64, i32::MAX as f64]
        );

        f.set(&program, &[0], &Value::from(0x8000_0000u32 as f64))
            .await
            .unwrap();

        let first = f.get(&program, &[0]).await.unwrap();

        assert_eq!(first.as_number(), Some(i32::MIN as f64));
    }

    #[tokio::test]
    async fn test_fill_by_ndrange() {
        let program = host_program();
        let f = program.field(I32, vec![3, 4]).unwrap();

        for index in ndrange(f.dimensions()) {
            let value = Value::from((index[0] * 10 + index[1]) as i32);

            f.set(&program, &index, &value).await.unwrap();
        }

        let read = f.to_array_1d(&program).await.unwrap();
        let expected: Vec<f64> = ndrange(&[3, 4])
            .iter()
            .map(|index| (index[0] * 10 + index[1]) as f64)
            .collect();

        assert_eq!(read, expected);
    }

    #[tokio::test]
    async fn test_fields_share_one_tree_until_materialized() {
        let program = host_program();
        let a = program.field(I32, vec![4]).unwrap();
        let b = program.vector_field(3, F32, vec![2]).unwrap();

        assert_eq!(a.tree(), b.tree());
        assert_eq!(a.offset_bytes(), 0);
        assert_eq!(b.offset_bytes(), a.size_bytes());
        assert!(!program.is_materialized(a.tree()));

        program.materialize_current_tree().await.unwrap();
        program.materialize_current_tree().await.unwrap();

        assert!(program.is_materialized(a.tree()));
        assert_eq!(program.runtime().tree_count(), 1);
        assert_eq!(
            program.tree_size_bytes(a.tree()),
            Some(a.size_bytes() + b.size_bytes())
        );

        let c = program.field(I32, vec![2]).unwrap();

        assert_ne!(c.tree(), a.tree());
        assert_eq!(c.offset_bytes(), 0);

        a.from_array_1d(&program, &[1.0, 2.0, 3.0, 4.0]).await.unwrap();
        b.from_array_1d(&program, &[0.5; 6]).await.unwrap();
        c.from_array_1d(&program, &[9.0, 9.0]).await.unwrap();

        assert_eq!(program.runtime().tree_count(), 2);
        assert_eq!(
            a.to_array_1d(&program).await.unwrap(),
            vec![1.0, 2.0, 3.0, 4.0]
        );
        assert_eq!(b.to_array_1d(&program).await.unwrap(), vec![0.5; 6]);
    }

    #[tokio::test]
    async fn test_concurrent_reads_materialize_once() {
        let program = host_program();
        let f = program.field(F32, vec![8]).unwrap();

        let (first, second) = tokio::join!(f.get(&program, &[0]), f.get(&program, &[7]));

        assert_eq!(first.unwrap(), Value::Number(0.0));
        assert_eq!(second.unwrap(), Value::Number(0.0));
        assert_eq!(program.runtime().tree_count(), 1);
    }

    #[tokio::test]
    async fn test_field_relative_transfer_bounds() {
        let program = host_program();
        let f = program.field(I32, vec![4]).unwrap();

        assert!(matches!(
            program.device_to_host(&f, Some(12), Some(8)).await,
            Err(FieldError::SizeMismatch { .. })
        ));
        assert!(matches!(
            program.host_to_device(&f, &[1, 2], Some(12)).await,
            Err(FieldError::SizeMismatch { .. })
        ));

        program.host_to_device(&f, &[5, 6], Some(8)).await.unwrap();

        let tail = program.device_to_host(&f, Some(8), None).await.unwrap();

        assert_eq!(tail.int_array, vec![5, 6]);
    }

    #[tokio::test]
    async fn test_allocation_limit_surfaces_device_error() {
        let config = RuntimeConfig {
            max_buffer_bytes: Some(16),
            ..RuntimeConfig::host()
        };
        let program = Program::new(HostRuntime::with_config(&config));
        let f = program.field(I32, vec![10]).unwrap();

        assert!(matches!(
            f.to_array_1d(&program).await,
            Err(FieldError::Device(GpuError::MemoryExhaustion {
                requested: 40,
                limit: 16
            }))
        ));
    }

    #[tokio::test]
    async fn test_invalid_field_declarations() {
        let program = host_program();

        assert!(matches!(
            program.field(I32, vec![]),
            Err(FieldError::Construction(_))
        ));
        assert!(matches!(
            program.field(I32, vec![2, 0]),
            Err(FieldError::Construction(_))
        ));
        assert!(matches!(
            program.vector_field(0, F32, vec![2]),
            Err(FieldError::Construction(_))
        ));
        assert!(matches!(
            program.struct_field(Vec::<(&str, ElementType)>::new(), vec![2]),
            Err(FieldError::Construction(_))
        ));
    }
}
